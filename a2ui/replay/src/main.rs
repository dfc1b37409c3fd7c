use a2ui_model_runtime::{ModelProcessor, ProcessorConfig, ServerToClientMessage, decode_messages};
use clap::Parser;
use log::{error, info};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "a2ui-replay")]
#[command(about = "Replay recorded A2UI messages and print the resulting surfaces")]
struct Cli {
    /// Message file: a JSON array or one message per line. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Only print this surface
    #[arg(long)]
    surface: Option<String>,

    /// Surface used for messages without surfaceId
    #[arg(long)]
    default_surface: Option<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("a2ui_replay fatal error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let payload = match &cli.input {
        Some(path) => fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let messages = parse_stream(&payload)?;
    info!("replaying {} messages", messages.len());

    let mut config = ProcessorConfig::from_env();
    if let Some(surface_id) = cli.default_surface {
        config = config.with_default_surface_id(surface_id);
    }

    let mut processor = ModelProcessor::with_config(config);
    let outcome = processor.process_messages(&messages);
    if let Err(err) = &outcome {
        error!("replay stopped early: {err}");
    }

    let output = render_output(&processor, cli.surface.as_deref())?;
    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");

    outcome?;
    Ok(())
}

/// Accepts a JSON array, a single message, or JSON Lines.
fn parse_stream(payload: &[u8]) -> Result<Vec<ServerToClientMessage>, serde_json::Error> {
    let whole_err = match decode_messages(payload) {
        Ok(messages) => return Ok(messages),
        Err(err) => err,
    };

    let text = String::from_utf8_lossy(payload);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
    if lines.len() < 2 {
        return Err(whole_err);
    }

    let mut messages = Vec::new();
    for line in lines {
        messages.extend(decode_messages(line.as_bytes())?);
    }
    Ok(messages)
}

fn render_output(
    processor: &ModelProcessor,
    surface_id: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    match surface_id {
        Some(surface_id) => {
            let surface = processor
                .surface(surface_id)
                .ok_or_else(|| format!("unknown surface: {surface_id}"))?;
            Ok(serde_json::to_value(surface)?)
        }
        None => Ok(serde_json::to_value(processor.surfaces())?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_array_stream() {
        let payload = br#"[{"beginRendering":{"root":"r"}},{"deleteSurface":{}}]"#;
        let messages = parse_stream(payload).expect("array stream");
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn parses_json_lines_stream() {
        let payload = b"{\"beginRendering\":{\"root\":\"r\",\"surfaceId\":\"S1\"}}\n\n{\"deleteSurface\":{\"surfaceId\":\"S1\"}}\n";
        let messages = parse_stream(payload).expect("jsonl stream");
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[1], ServerToClientMessage::DeleteSurface(_)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_stream(b"not json").is_err());
        assert!(parse_stream(b"{\"beginRendering\":{\"root\":\"r\"}}\nnope").is_err());
    }

    #[test]
    fn renders_single_surface_or_all() {
        let mut processor = ModelProcessor::new();
        processor
            .process_json(br#"[
                {"surfaceUpdate":{"surfaceId":"S1","components":[{"id":"t","component":{"Text":{"text":{"literalString":"Hi"}}}}]}},
                {"beginRendering":{"surfaceId":"S1","root":"t"}}
            ]"#)
            .expect("process");

        let all = render_output(&processor, None).expect("all surfaces");
        assert_eq!(all["S1"]["componentTree"]["type"], json!("Text"));

        let one = render_output(&processor, Some("S1")).expect("one surface");
        assert_eq!(one["rootComponentId"], json!("t"));

        assert!(render_output(&processor, Some("missing")).is_err());
    }
}
