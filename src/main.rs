use clap::Parser;
use env_logger::{Builder, Env};
use ilocalloc::analysis::simulate;
use ilocalloc::backend::generator;
use ilocalloc::driver;
use ilocalloc::ir::RegisterView;
use ilocalloc::Error;
use std::path::PathBuf;
use std::process;

/// Allocates registers for a single ILOC basic block.
#[derive(Parser, Debug)]
#[command(name = "ilocalloc", version)]
struct Args {
    /// Physical registers available, including the one reserved for spill code.
    #[arg(short = 'k', long = "registers", required_unless_present_any = ["rename_only", "parse_only"])]
    registers: Option<usize>,

    /// Print the block over virtual registers instead of allocating.
    #[arg(short = 'x', long, conflicts_with = "parse_only")]
    rename_only: bool,

    /// Only check the syntax of the block.
    #[arg(short = 'p', long)]
    parse_only: bool,

    /// Execute the allocated block and print its output values.
    #[arg(short = 's', long)]
    simulate: bool,

    file: PathBuf,
}

fn report(err: &Error) {
    match err {
        Error::Syntax(diagnostics) => {
            for diagnostic in diagnostics {
                eprintln!("ERROR {}", diagnostic);
            }
        }
        err => eprintln!("Error: {err}"),
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let source_code = driver::read_source(&args.file)?;

    if args.parse_only {
        let lowered = driver::parse_block(&source_code)?;
        println!("Parse succeeded: {} operation(s)", lowered.block.len());
        return Ok(());
    }

    if args.rename_only {
        print!("{}", driver::rename_source(&source_code)?);
        return Ok(());
    }

    // clap rejects a missing -k unless one of the modes above was chosen
    let registers = args.registers.unwrap_or_default();
    let allocated = driver::allocate_block(&source_code, registers)?;
    print!("{}", generator::render(&allocated.block, RegisterView::Physical)?);

    if args.simulate {
        let trace = simulate::run(&allocated.block, RegisterView::Physical)?;
        // as comments, so stdout stays valid ILOC
        for value in trace.outputs {
            println!("// output {value}");
        }
    }

    Ok(())
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    if let Err(err) = run(&args) {
        report(&err);
        process::exit(1);
    }
}
