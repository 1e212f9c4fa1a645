//! Newline-delimited JSON connection driver shared by the stdio and TCP
//! transports.
//!
//! Each line read is one inbound message. Each response is written as one
//! line. A single writer task owns the output side.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace, warn};

use super::TransportResult;
use crate::core::McpServer;
use crate::core::session::Outbound;

/// What to do with in-flight requests when the reader reaches EOF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnEof {
    /// Answer everything already accepted, then close.
    Drain,
    /// Close immediately and discard pending results.
    Abandon,
}

/// Serve one connection until its input ends.
pub(crate) async fn serve_lines<R, W>(
    server: McpServer,
    reader: R,
    writer: W,
    on_eof: OnEof,
) -> TransportResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let sessions = server.sessions().clone();
    let (id, outbound) = sessions.connect().await;
    sessions.open(id).await?;

    let writer_task = tokio::spawn(write_responses(outbound, writer));

    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                trace!("Received on {}: {}", id, line);
                if let Err(e) = server.submit(id, line).await {
                    warn!("Connection {} stopped accepting messages: {}", id, e);
                    break;
                }
            }
            Ok(None) => {
                debug!("Input closed on {}", id);
                break;
            }
            Err(e) => {
                warn!("Read error on {}: {}", id, e);
                break;
            }
        }
    }

    if on_eof == OnEof::Drain {
        sessions.finish(id).await?;
        if let Err(e) = writer_task.await {
            warn!("Writer task for {} failed: {}", id, e);
        }
        sessions.close(id).await;
    } else {
        sessions.close(id).await;
        if let Err(e) = writer_task.await {
            warn!("Writer task for {} failed: {}", id, e);
        }
    }

    Ok(())
}

async fn write_responses<W>(mut outbound: Outbound, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = outbound.recv().await {
        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize response: {}", e);
                continue;
            }
        };
        trace!("Sending on {}: {}", outbound.connection_id(), json);

        let written = async {
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!("Write error on {}: {}", outbound.connection_id(), e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::domains::tools::{Arguments, ParamType, Tool};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};

    fn server() -> McpServer {
        McpServer::builder(Config::default())
            .with_builtin_tools()
            .unwrap()
            .tool(
                Tool::builder("nap")
                    .param("tag", ParamType::String)
                    .sync_handler(|args: &Arguments| {
                        std::thread::sleep(Duration::from_millis(150));
                        Ok(json!(args.get_str("tag")?))
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .build()
    }

    fn nap(id: i64) -> String {
        json!({ "jsonrpc": "2.0", "id": id, "method": "tools/call",
                "params": { "name": "nap", "arguments": { "tag": "late" } } })
        .to_string()
    }

    async fn run(input: &str, on_eof: OnEof) -> Vec<Value> {
        let (client, server_side) = tokio::io::duplex(64 * 1024);

        serve_lines(server(), input.as_bytes(), server_side, on_eof)
            .await
            .unwrap();

        let mut out = Vec::new();
        let mut lines = BufReader::new(client).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            out.push(serde_json::from_str(&line).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_drain_answers_everything() {
        let input = [
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                    "params": { "name": "echo", "arguments": { "message": "hi" } } }),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" }),
        ]
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n\n");

        let mut responses = run(&input, OnEof::Drain).await;
        responses.sort_by_key(|r| r["id"].as_i64());

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"], "hi");
        assert_eq!(responses[1]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_garbage_line_gets_parse_error() {
        let responses = run("this is not json\n", OnEof::Drain).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], "PARSE_ERROR");
        assert_eq!(responses[0]["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_abandon_discards_pending_results() {
        let responses = run(&nap(1), OnEof::Abandon).await;
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_drain_waits_for_slow_calls() {
        let responses = run(&nap(3), OnEof::Drain).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 3);
        assert_eq!(responses[0]["result"], "late");
    }
}
