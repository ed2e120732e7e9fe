use clap::Parser;
use mimalloc::MiMalloc;
use rtf::{ParserConfig, ParserState, RtfParser, TextDocument};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "rtfscope")]
#[command(about = "Resolves the formatting ranges of an RTF document")]
struct Args {
    /// Drop scope attributes that the scope's style already provides
    #[arg(long)]
    check_style: bool,
    /// Parse into an existing document: defaults go into every scope
    /// instead of the attribute pool
    #[arg(long)]
    existing: bool,
    /// Path to the RTF file
    file: PathBuf,
}

impl Args {
    fn config(&self) -> ParserConfig {
        ParserConfig {
            check_style_attrs: self.check_style,
            new_document: !self.existing,
            ..ParserConfig::default()
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let path = args.file.display();
    let input = match fs::read(&args.file) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("failed to read {path}: {err}");
            return ExitCode::from(2);
        }
    };

    let mut parser = RtfParser::new(TextDocument::new(), args.config());
    if parser.parse(&input) != ParserState::Accepted {
        match parser.error() {
            Some(error) => eprintln!("{path}: {error}"),
            None => eprintln!("{path}: parse stopped in state {:?}", parser.state()),
        }
        return ExitCode::FAILURE;
    }

    for line in parser.document().snapshot_lines() {
        println!("{line}");
    }
    for (index, color) in parser.colors().iter().enumerate() {
        println!("color {index} {color}");
    }
    for (id, font) in parser.fonts().iter() {
        println!("font {id} {font}");
    }
    for (id, style) in parser.styles().iter() {
        println!("style {id} {:?} {}", style.name, style.attrs);
    }
    eprintln!("{:?}", parser.stats());
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_parser_config() {
        let args = Args::try_parse_from(["rtfscope", "--check-style", "--existing", "in.rtf"])
            .expect("args");
        let config = args.config();
        assert!(config.check_style_attrs);
        assert!(!config.new_document);
        assert_eq!(args.file, PathBuf::from("in.rtf"));
    }

    #[test]
    fn defaults_parse_into_a_new_document() {
        let config = Args::try_parse_from(["rtfscope", "in.rtf"])
            .expect("args")
            .config();
        assert!(!config.check_style_attrs);
        assert!(config.new_document);
    }

    #[test]
    fn file_is_required() {
        assert!(Args::try_parse_from(["rtfscope", "--check-style"]).is_err());
    }
}
