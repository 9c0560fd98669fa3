//! Scry CLI — inspect device kernels through the lowering pipeline.
//!
//! Runs against the simulated backend and driver, so every stage of the
//! reflection surface can be exercised without hardware.

mod commands;

use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scry", version, about = "Device-code reflection and interception")]
struct Cli {
    /// Reflect without a bound device (capability falls back to the
    /// highest supported target)
    #[arg(long, global = true)]
    no_device: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the un-type-inferred lowered form of a kernel
    Lowered {
        /// Kernel name (see 'scry kernels')
        kernel: String,
    },
    /// Show the type-inferred form of a kernel
    Typed {
        kernel: String,
    },
    /// Show a kernel's intermediate representation
    Ir {
        kernel: String,
        /// Keep metadata/debug-info annotations
        #[arg(long)]
        raw: bool,
        /// Dump the whole module instead of the single function
        #[arg(long)]
        module: bool,
        /// Skip optimization passes
        #[arg(long)]
        unoptimized: bool,
        /// Verify as early as possible
        #[arg(long)]
        strict: bool,
    },
    /// Show a kernel's target assembly
    Asm {
        kernel: String,
        /// Keep metadata comments
        #[arg(long)]
        raw: bool,
        /// Verify as early as possible
        #[arg(long)]
        strict: bool,
    },
    /// Show a kernel's disassembled binary listing
    Binary {
        kernel: String,
        /// Request source-line annotations from the disassembler
        #[arg(long)]
        verbose: bool,
    },
    /// Launch every demo kernel and dump all stages per kernel to a directory
    Dump {
        /// Output directory
        dir: String,
    },
    /// List registered demo kernels
    Kernels,
    /// List capabilities this build supports targeting
    Targets,
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let stack = commands::demo_stack(cli.no_device);

    match cli.command {
        Commands::Lowered { kernel } => commands::reflect::lowered(&stack, &kernel),
        Commands::Typed { kernel } => commands::reflect::typed(&stack, &kernel),
        Commands::Ir {
            kernel,
            raw,
            module,
            unoptimized,
            strict,
        } => commands::reflect::ir(&stack, &kernel, raw, module, unoptimized, strict),
        Commands::Asm {
            kernel,
            raw,
            strict,
        } => commands::reflect::asm(&stack, &kernel, raw, strict),
        Commands::Binary { kernel, verbose } => commands::reflect::binary(&stack, &kernel, verbose),
        Commands::Dump { dir } => commands::dump::run(&stack, &dir),
        Commands::Kernels => commands::reflect::kernels(&stack),
        Commands::Targets => commands::targets::list(&stack),
    }
}
