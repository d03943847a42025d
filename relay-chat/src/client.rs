use anyhow::{Context, Result};
use tokio::{
    io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines, Stdin},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    select,
};
use tracing::{info, warn};

use crate::{cli::ClientArgs, session::READ_CHUNK};

const PROMPT: &str = "> ";

pub async fn run(args: ClientArgs) -> Result<()> {
    let addr = args.server_addr();
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    info!("connected to {addr}");

    let (mut reader, mut writer) = stream.into_split();
    write_stdout(b"Connected to the server. You can start chatting!\n").await?;
    write_stdout(b"Type your message and press Enter to send.\n").await?;
    write_stdout(PROMPT.as_bytes()).await?;

    // `next_line` keeps partial input buffered when another branch wins.
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    run_client_loop(&mut reader, &mut writer, &mut stdin).await?;
    shutdown_connection(&mut writer).await;

    Ok(())
}

async fn run_client_loop(
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
    stdin: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        select! {
            received = reader.read(&mut buf) => {
                if !handle_server_bytes(received, &buf).await? {
                    break;
                }
            }
            line = stdin.next_line() => {
                if !handle_stdin_line(line, writer).await? {
                    break;
                }
            }
            ctrl_c = tokio::signal::ctrl_c() => {
                if let Err(error) = ctrl_c {
                    warn!(?error, "ctrl-c handler failed");
                }
                break;
            }
        }
    }
    Ok(())
}

async fn handle_server_bytes(received: io::Result<usize>, buf: &[u8]) -> Result<bool> {
    match received {
        Ok(0) => {
            write_stdout(b"\nServer closed the connection.\n").await?;
            Ok(false)
        }
        Ok(n) => {
            write_stdout(&render_incoming(&buf[..n])).await?;
            Ok(true)
        }
        Err(error) => {
            warn!(?error, "failed to read from server");
            write_stdout(b"\nServer closed the connection.\n").await?;
            Ok(false)
        }
    }
}

/// Overwrites the pending prompt with the received bytes, then redraws the
/// prompt. Bytes pass through untouched, even a character split across reads.
fn render_incoming(received: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(received.len() + PROMPT.len() + 2);
    out.push(b'\r');
    out.extend_from_slice(received);
    out.push(b'\n');
    out.extend_from_slice(PROMPT.as_bytes());
    out
}

async fn handle_stdin_line(
    line: io::Result<Option<String>>,
    writer: &mut OwnedWriteHalf,
) -> Result<bool> {
    let Some(line) = line? else {
        return Ok(false);
    };

    if !line.is_empty() {
        writer
            .write_all(line.as_bytes())
            .await
            .context("failed to send message")?;
    }
    write_stdout(PROMPT.as_bytes()).await?;
    Ok(true)
}

async fn shutdown_connection(writer: &mut OwnedWriteHalf) {
    if let Err(error) = writer.shutdown().await {
        warn!(?error, "failed to shutdown client writer cleanly");
    }
}

async fn write_stdout(bytes: &[u8]) -> io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(bytes).await?;
    stdout.flush().await
}
