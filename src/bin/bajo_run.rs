use std::fs;
use std::process::ExitCode;

use bajo_vm::disasm::disassemble_one;
use bajo_vm::error::VmError;
use bajo_vm::memory::FlatMemory;
use bajo_vm::vm::{Vm, VmConfig};
use clap::Parser;
use clap_num::maybe_hex;
use tracing_subscriber::EnvFilter;

/// Run a bajo bytecode program against a flat-memory host.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to a raw bytecode file, loaded at address 0
    input: String,

    /// Program counter to start execution at (use 0x prefix for hex)
    #[arg(short, long, value_parser=maybe_hex::<u32>, default_value = "0")]
    entry: u32,

    /// Print each instruction before executing it
    #[arg(short, long)]
    trace: bool,

    /// Raise an error on division by zero instead of an
    /// implementation-defined result
    #[arg(long)]
    err_on_zero_division: bool,

    /// Raise an error on signed INT_MIN / -1 instead of wrapping
    #[arg(long)]
    err_on_int_overflow: bool,

    /// Load VmConfig fields from a TOML file; CLI flags above override
    /// values it sets
    #[arg(long)]
    config: Option<String>,
}

fn load_config(args: &Args) -> Result<VmConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))?;
            toml::from_str(&text).map_err(|e| format!("parsing {path}: {e}"))?
        }
        None => VmConfig::default(),
    };
    if args.err_on_zero_division {
        config.err_on_zero_division = true;
    }
    if args.err_on_int_overflow {
        config.err_on_int_overflow = true;
    }
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let program = match fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error reading {}: {e}", args.input);
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error loading config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut vm = Vm::new(FlatMemory::with_program(&program), config);
    vm.init(args.entry);

    let terminal = loop {
        if args.trace {
            let mut pc = vm.pc();
            match disassemble_one(vm.host_mut(), &mut pc) {
                Ok(instr) => println!("{instr}"),
                Err(e) => eprintln!("(trace decode failed: {e})"),
            }
        }

        if let Err(e) = vm.step() {
            break e;
        }
    };

    match terminal {
        VmError::Exit => {
            let rc = vm.exit_rc();
            if rc != 0 {
                eprintln!("exited with code {rc}");
            }
            // clamp to a valid process exit code
            ExitCode::from((rc & 0xFF) as u8)
        }
        other => {
            eprintln!("fault at pc=0x{:x}: {other}", vm.pc());
            ExitCode::FAILURE
        }
    }
}
