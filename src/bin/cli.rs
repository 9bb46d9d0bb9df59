//! EmberKV CLI Client
//!
//! Command-line interface for interacting with EmberKV.

use std::io::BufReader;
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use emberkv::protocol::{read_response, write_value, Command, Response, Value};

/// EmberKV CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv-cli")]
#[command(about = "CLI for the EmberKV key-value server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Echo a message back
    Echo {
        /// The message to echo
        message: String,
    },

    /// Ping the server
    Ping,
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Get { key } => Command::Get { key: key.into() },
            Commands::Set { key, value } => Command::Set {
                key: key.into(),
                value: value.into(),
            },
            Commands::Echo { message } => Command::Echo {
                message: message.into(),
            },
            Commands::Ping => Command::Ping,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let command = Command::from(args.command);

    match run(&args.server, &command) {
        Ok(response) => {
            let failed = response.is_error();
            print_response(&response);
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(server: &str, command: &Command) -> emberkv::Result<Response> {
    let mut stream = TcpStream::connect(server)?;
    write_value(&mut stream, &command.to_value())?;

    let mut reader = BufReader::new(stream);
    read_response(&mut reader)
}

fn print_response(response: &Response) {
    match response {
        Response::Value(value) => print_value(value, 0),
        Response::Error(message) => println!("(error) {}", message),
    }
}

fn print_value(value: &Value, indent: usize) {
    let pad = " ".repeat(indent);
    match value {
        Value::SimpleString(text) => println!("{}{}", pad, String::from_utf8_lossy(text)),
        Value::BulkString(data) => println!("{}\"{}\"", pad, String::from_utf8_lossy(data)),
        Value::Array(elements) if elements.is_empty() => println!("{}(empty array)", pad),
        Value::Array(elements) => {
            for (i, element) in elements.iter().enumerate() {
                println!("{}{})", pad, i + 1);
                print_value(element, indent + 2);
            }
        }
    }
}
