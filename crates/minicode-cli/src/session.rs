use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use cliclack::spinner;
use console::style;
use futures::StreamExt;
use indoc::indoc;
use minicode::agents;
use minicode::code_engine::{analyze_error, execute_file};
use minicode::models::message::Message;
use minicode::orchestrator::Orchestrator;
use rustyline::error::ReadlineError;
use rustyline::history::History;
use rustyline::DefaultEditor;

const PROMPT: &str = "\x1b[1m\x1b[38;5;30mminicode> \x1b[0m";

const SYSTEM_PROMPT: &str = indoc! {"
    You are MiniCode, an intelligent coding assistant. You help developers with:
    - Answering coding questions and explaining concepts
    - Reading and analyzing code files
    - Running code and debugging errors
    - Suggesting fixes and improvements
    - Writing new code snippets

    When users run code that fails, analyze the error and offer specific fixes. Be concise, practical, and focus on working solutions."};

const HELP: &str = indoc! {"
    /agents          list the available agents
    /agent <role>    show an agent's capabilities
    /model [id]      show or switch the model
    /read <file>     add a file to the conversation
    /run <file>      execute a file and add the result
    /exit            end the session"};

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Message(String),
    Agents,
    Agent(String),
    Model(Option<String>),
    Read(String),
    Run(String),
    Help,
    Exit,
    Empty,
    Unknown(String),
}

/// Classify one line typed at the prompt
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if !line.starts_with('/') {
        return Input::Message(line.to_string());
    }

    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };
    match (command.to_lowercase().as_str(), arg) {
        ("/exit" | "/quit", _) => Input::Exit,
        ("/help" | "/?", _) => Input::Help,
        ("/agents", _) => Input::Agents,
        ("/model", "") => Input::Model(None),
        ("/model", model) => Input::Model(Some(model.to_string())),
        ("/agent", role) if !role.is_empty() => Input::Agent(role.to_string()),
        ("/read", path) if !path.is_empty() => Input::Read(path.to_string()),
        ("/run", path) if !path.is_empty() => Input::Run(path.to_string()),
        _ => Input::Unknown(line.to_string()),
    }
}

/// Add a typed line to the editor history, skipping blank input
fn remember<H: History>(history: &mut H, line: &str) -> Result<()> {
    if !line.trim().is_empty() {
        history.add(line)?;
    }
    Ok(())
}

/// Interactive chat over a growing conversation
pub struct Session {
    orchestrator: Orchestrator,
    messages: Vec<Message>,
    editor: DefaultEditor,
}

impl Session {
    pub fn new(orchestrator: Orchestrator) -> Result<Self> {
        Ok(Session {
            orchestrator,
            messages: vec![Message::system(SYSTEM_PROMPT)],
            editor: DefaultEditor::new()?,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        println!(
            "{} {}",
            style("MiniCode").bold().cyan(),
            style("- type /help for commands, /exit to quit").dim()
        );

        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("Input error: {}", e);
                    break;
                }
            };
            remember(self.editor.history_mut(), &line)?;

            match parse_input(&line) {
                Input::Exit => break,
                Input::Empty => continue,
                Input::Help => println!("{}", HELP),
                Input::Agents => println!("{}", agents::list_agents()),
                Input::Agent(role) => match agents::get_agent_info(&role) {
                    Ok(info) => println!("{}", info),
                    Err(e) => eprintln!("{}", style(e).red()),
                },
                Input::Model(None) => match self.orchestrator.model() {
                    Some(model) => println!("Model: {}", model),
                    None => println!("Model: provider default"),
                },
                Input::Model(Some(model)) => {
                    self.orchestrator.set_model(model.as_str());
                    println!("Switched to {}", style(model).bold());
                }
                Input::Read(path) => self.read_file(&path),
                Input::Run(path) => self.run_file(&path).await,
                Input::Unknown(command) => {
                    eprintln!("Unknown command: {} (try /help)", command)
                }
                Input::Message(text) => self.reply(text).await?,
            }
        }

        println!("{}", style("Goodbye!").dim());
        Ok(())
    }

    fn read_file(&mut self, path: &str) {
        match std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path)) {
            Ok(content) => {
                self.messages.push(Message::assistant(format!(
                    "File: {}\n\n```\n{}\n```",
                    path, content
                )));
                println!("Added {} ({} lines) to the conversation", path, content.lines().count());
            }
            Err(e) => eprintln!("{}", style(format!("{:#}", e)).red()),
        }
    }

    async fn run_file(&mut self, path: &str) {
        let result = match execute_file(Path::new(path), None).await {
            Ok(result) => result,
            Err(e) => {
                eprintln!("{}", style(format!("Failed to execute: {}", e)).red());
                return;
            }
        };

        let summary = result.summary();
        println!("{}", summary);
        self.messages.push(Message::assistant(summary));

        if !result.succeeded() {
            let analysis = analyze_error(&result.stderr);
            println!("\n{}", style(&analysis).yellow());
            self.messages.push(Message::assistant(format!(
                "\n{}\n\nWould you like me to suggest a fix?",
                analysis
            )));
        }
    }

    /// Stream the answer to stdout as it arrives. A failed turn is dropped from the history.
    async fn reply(&mut self, text: String) -> Result<()> {
        self.messages.push(Message::user(text).stamped());

        let spin = spinner();
        spin.start("Thinking...");
        let mut stream = match self.orchestrator.chat(&self.messages).await {
            Ok(stream) => stream,
            Err(e) => {
                spin.stop("");
                eprintln!("{}", style(format!("Error: {}", e)).red());
                self.messages.pop();
                return Ok(());
            }
        };

        let mut answer = String::new();
        let mut waiting = true;
        let mut stdout = io::stdout();
        while let Some(fragment) = stream.next().await {
            if waiting {
                spin.stop("");
                waiting = false;
            }
            match fragment {
                Ok(fragment) if fragment.done => break,
                Ok(fragment) => {
                    print!("{}", fragment.content);
                    stdout.flush()?;
                    answer.push_str(&fragment.content);
                }
                Err(e) => {
                    eprintln!("\n{}", style(format!("Error: {}", e)).red());
                    self.messages.pop();
                    return Ok(());
                }
            }
        }
        if waiting {
            spin.stop("");
        }
        println!("\n");

        self.messages.push(Message::assistant(answer).stamped());
        Ok(())
    }
}
