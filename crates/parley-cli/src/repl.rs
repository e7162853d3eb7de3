//! Line-oriented chat loop over stdin/stdout.

use std::io::Write;
use std::sync::Mutex;

use parley_ai::CompletionClient;
use tokio::io::{AsyncBufReadExt, BufReader};

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Quit,
    Reset,
    Usage,
    Query(&'a str),
    Empty,
}

pub fn parse_line(line: &str) -> Command<'_> {
    match line.trim() {
        "" => Command::Empty,
        "/quit" | "/exit" => Command::Quit,
        "/reset" => Command::Reset,
        "/usage" => Command::Usage,
        query => Command::Query(query),
    }
}

pub async fn run(client: &CompletionClient, session_id: &str) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Command::Quit => break,
            Command::Empty => {}
            Command::Reset => {
                client.reset_session(session_id).await;
                println!("(session cleared)");
            }
            Command::Usage => {
                let usage = client.usage();
                println!(
                    "calls: {}, completion tokens: {}, total tokens: {}",
                    usage.calls, usage.completion_tokens, usage.total_tokens
                );
            }
            Command::Query(query) => {
                let echoed = Mutex::new(String::new());
                let reply = client
                    .reply_streaming(query, session_id, &|text| {
                        print!("{text}");
                        let _ = std::io::stdout().flush();
                        if let Ok(mut echoed) = echoed.lock() {
                            echoed.push_str(text);
                        }
                    })
                    .await;
                let echoed = echoed.into_inner().unwrap_or_default();
                if !echoed.is_empty() {
                    println!();
                }
                // Canned and error replies never pass through the observer.
                if echoed.is_empty() || !echoed.ends_with(&reply) {
                    println!("{reply}");
                }
            }
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line("/quit"), Command::Quit);
        assert_eq!(parse_line(" /reset "), Command::Reset);
        assert_eq!(parse_line("/usage"), Command::Usage);
        assert_eq!(parse_line("   "), Command::Empty);
        assert_eq!(parse_line(" hello "), Command::Query("hello"));
    }
}
