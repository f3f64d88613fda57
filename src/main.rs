use std::path::{Path, PathBuf};
use std::{env, fs, process};

use ember::Error;
use ember::bytecode::Bytecode;
use ember::bytecode::disasm::disassemble_program;
use ember::runtime::Vm;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }
    let disasm = args.contains(&"--disasm".to_string());

    // first non-flag argument is the filename
    let Some(filename) = args.iter().skip(1).find(|a| !a.starts_with('-')) else {
        print_usage();
        process::exit(1);
    };
    ensure_extension(filename);

    let result = if disasm {
        load(filename).map(|bytecode| print!("{}", disassemble_program(&bytecode)))
    } else {
        run_file(filename)
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so program output stays clean; `RUST_LOG=ember=trace`
/// shows every executed instruction.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn ensure_extension(filename: &str) {
    let path = Path::new(filename);
    if path.extension().and_then(|e| e.to_str()) != Some("emb") {
        eprintln!("Error: expected a compiled .emb file, got {}", filename);
        process::exit(1);
    }
}

fn load(filename: &str) -> Result<Bytecode, Error> {
    let bytes = fs::read(filename).map_err(|source| Error::Io {
        path: PathBuf::from(filename),
        source,
    })?;
    Ok(Bytecode::from_bytes(&bytes)?)
}

fn run_file(filename: &str) -> Result<(), Error> {
    let bytecode = load(filename)?;
    let value = Vm::new(bytecode).run()?;
    println!("{}", value);
    Ok(())
}

fn print_usage() {
    println!("EMBER - bytecode virtual machine");
    println!();
    println!("Usage:");
    println!("  ember <file.emb>           Run a compiled program and print its value");
    println!("  ember --disasm <file.emb>  Print the disassembly instead of running");
    println!("  ember --help, -h           Show this help");
    println!();
    println!("Set RUST_LOG (e.g. RUST_LOG=ember=debug) for compiler and VM logs.");
}
