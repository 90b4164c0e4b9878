use std::path::Path;

use anyhow::{bail, Context, Result};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

fn main() {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        bail!("usage: gram <filename>...");
    }

    // files are compiled one at a time; the first fatal diagnostic aborts
    // the whole process, later files are not attempted
    for arg in &args {
        compile_file(Path::new(arg))?;
    }
    Ok(())
}

fn compile_file(path: &Path) -> Result<()> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;

    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    };

    log::info!("compiling {name}");

    let compiled = match gram::compile(&src) {
        Ok(compiled) => compiled,
        Err(diag) => bail!("{}", diag.report(&name)),
    };

    for option in compiled.grammar.options() {
        log::info!("option +{option}");
    }

    for (rule, first) in compiled.iter_first() {
        let terminals: Vec<&str> = first.terminals().collect();
        println!("{rule}: {terminals:?}");
    }
    Ok(())
}
