//! Line-oriented terminal front end: prints status updates as they arrive,
//! renders proposed diffs immediately, and feeds user lines to the agent.

use anyhow::Result;
use hypr_scribe_core::{Agent, StatusUpdate};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub async fn run(mut agent: Agent, mut updates: mpsc::Receiver<StatusUpdate>) -> Result<()> {
    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            if let Some(diff) = update.diff {
                println!("· {}", update.message);
                println!("--- proposed changes ---");
                println!("{}", diff.trim_end());
                println!("------------------------");
            } else {
                println!("· {}", update.message);
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match input {
            ":quit" | ":q" => break,
            ":reset" => {
                agent.reset();
                println!("conversation cleared");
                continue;
            }
            _ => {}
        }

        let cancel = CancellationToken::new();
        let reply = {
            let fut = agent.process_message(&cancel, input);
            tokio::pin!(fut);
            tokio::select! {
                reply = &mut fut => reply,
                _ = tokio::signal::ctrl_c() => {
                    // Signal the agent and wait for it to unwind cleanly.
                    cancel.cancel();
                    fut.await
                }
            }
        };

        match reply {
            Ok(text) => println!("\nscribe> {text}\n"),
            Err(err) => eprintln!("\nerror: {err}\n"),
        }
    }

    printer.abort();
    Ok(())
}
