use clap::Parser;
use anyhow::Result;
use dotenvy::dotenv;

mod corpus;
mod llm;
mod output;
mod pipeline;
mod probe;
mod telemetry;
mod tokenizer;

#[derive(Parser)]
#[command(name = "extract-probe", about = "Measure how much of a corpus a model reproduces verbatim")]
struct Cli {
    #[command(flatten)]
    probe: probe::ProbeCmd,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // initialize logging/tracing (stderr). Respect RUST_LOG and PROBE_LOG_FORMAT
    telemetry::config::init_tracing();

    probe::run(cli.probe).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_and_tokenizer_are_required() {
        assert!(Cli::try_parse_from(["extract-probe", "--model", "m"]).is_err());
        assert!(Cli::try_parse_from(["extract-probe", "--tokenizer", "t"]).is_err());
        assert!(Cli::try_parse_from(["extract-probe", "--model", "m", "--tokenizer", "t"]).is_ok());
    }

    #[test]
    fn tokenizer_help_names_tokenizer_json() {
        use clap::CommandFactory;
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("tokenizer.json"), "{help}");
        assert!(help.contains("vocab.json/merges.txt"), "{help}");
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["extract-probe", "--model", "m", "--tokenizer", "t", "--json"]).is_err());
    }
}
