use beaver::enumerate::LOTS;
use beaver::loader::ProgramLoader;
use beaver::machine::{Machine, MachineConfig};
use beaver::programs::MachineCatalog;
use beaver::types::{state_letter, HaltingMode, MachineError, Outcome, TransitionTable};
use beaver::{parse, search_lin_3_2, Tape, DEFAULT_STEP_BUDGET};
use clap::Parser;
use std::io::Read;
use std::path::Path;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Program notation to run, or `-` to read it from standard input
    notation: Option<String>,

    /// Run the first program from the given file
    #[clap(short, long)]
    program: Option<String>,

    /// Run a machine from the built-in catalog by name
    #[clap(short, long)]
    machine: Option<String>,

    /// List the built-in catalog machines
    #[clap(short, long)]
    list: bool,

    /// Run the full census of normalized 3-state 2-symbol programs
    #[clap(long)]
    search: bool,

    /// Step budget for the run
    #[clap(short, long, default_value_t = DEFAULT_STEP_BUDGET)]
    steps: usize,

    /// Hunt for a recurrence with the given observation budget
    #[clap(long, value_name = "OBSERVATIONS")]
    detect: Option<usize>,

    /// Halt when the tape goes blank instead of on a halt instruction
    #[clap(long)]
    blank_halt: bool,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print results as JSON
    #[clap(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), MachineError> {
    if cli.list {
        return list_machines(cli.json);
    }
    if cli.search {
        return run_search(cli.json);
    }

    let table = resolve_table(&cli)?;
    let halting = if cli.blank_halt {
        HaltingMode::BlankTapeHalt
    } else {
        HaltingMode::ExplicitHaltState
    };
    let mut machine = Machine::new(MachineConfig {
        step_budget: cli.steps,
        halting,
        detector_budget: cli.detect,
        ..MachineConfig::default()
    })?;

    if cli.debug {
        trace(&mut machine, &table, cli.json)
    } else {
        let outcome = machine.run(&table)?;
        report_outcome(&machine, outcome, cli.json)
    }
}

/// Picks the program source: notation argument, program file, or catalog
/// name, in that order.
fn resolve_table(cli: &Cli) -> Result<TransitionTable, MachineError> {
    if let Some(notation) = &cli.notation {
        if notation == "-" {
            return read_stdin_table();
        }
        return parse(notation);
    }
    if let Some(path) = &cli.program {
        return ProgramLoader::load_table(Path::new(path));
    }
    if let Some(name) = &cli.machine {
        return MachineCatalog::get(name);
    }

    Err(MachineError::ValidationError(
        "No program given; pass notation, --program, or --machine".to_string(),
    ))
}

fn read_stdin_table() -> Result<TransitionTable, MachineError> {
    if atty::is(atty::Stream::Stdin) {
        return Err(MachineError::ValidationError(
            "Standard input is a terminal; pipe a program in".to_string(),
        ));
    }

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| MachineError::FileError(format!("Failed to read standard input: {}", e)))?;

    parse(&input)
}

fn trace(machine: &mut Machine, table: &TransitionTable, json: bool) -> Result<(), MachineError> {
    machine.load(table)?;
    print_state(machine);

    loop {
        match machine.step(table)? {
            None => print_state(machine),
            Some(outcome) => {
                println!();
                return report_outcome(machine, outcome, json);
            }
        }
    }
}

fn print_state(machine: &Machine) {
    println!(
        "Step: {}, State: {}, Tape: {}",
        machine.step_count(),
        state_letter(machine.state()),
        render_tape(machine.tape())
    );
}

/// Renders the touched portion of the tape with the head cell bracketed.
fn render_tape(tape: &Tape) -> String {
    let (low, _) = tape.touched();
    tape.touched_symbols()
        .iter()
        .enumerate()
        .map(|(offset, symbol)| {
            if low + offset == tape.head() {
                format!("[{}]", symbol)
            } else {
                symbol.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn report_outcome(machine: &Machine, outcome: Outcome, json: bool) -> Result<(), MachineError> {
    if json {
        let summary = serde_json::json!({
            "outcome": outcome,
            "steps": machine.step_count(),
            "marks": machine.marks(),
        });
        println!("{}", summary);
        return Ok(());
    }

    match outcome {
        Outcome::Halted { steps, marks } => {
            println!("Halted after {} steps with {} marks.", steps, marks)
        }
        Outcome::StepLimitExceeded => {
            println!("Gave up after {} steps without halting.", machine.step_count())
        }
        Outcome::LoopDetected => println!(
            "Proven non-halting: recurrence found at step {}.",
            machine.step_count()
        ),
        Outcome::Spill => println!(
            "Tape record outgrew the detection window at step {}.",
            machine.step_count()
        ),
        Outcome::NoRecurrenceFound => println!(
            "No recurrence found within {} steps.",
            machine.step_count()
        ),
    }

    Ok(())
}

fn list_machines(json: bool) -> Result<(), MachineError> {
    let names = MachineCatalog::names();

    if json {
        let infos = names
            .iter()
            .map(|name| MachineCatalog::info(name))
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&infos).map_err(json_error)?);
        return Ok(());
    }

    for name in names {
        let info = MachineCatalog::info(&name)?;
        println!(
            "{:<22} {}x{}  {}",
            info.name, info.states, info.symbols, info.notation
        );
    }

    Ok(())
}

fn run_search(json: bool) -> Result<(), MachineError> {
    let report = search_lin_3_2()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).map_err(json_error)?);
        return Ok(());
    }

    println!("Enumerated {} programs in {} lots:", report.enumerated, LOTS);
    println!("  stoppers:        {}", report.stoppers);
    println!("  candidates:      {}", report.candidates);
    println!("    pruned:        {}", report.pruned);
    println!("    looping:       {}", report.looping);
    println!("    spills:        {}", report.spills);
    println!("    late stoppers: {}", report.late_stoppers);
    println!("    holdouts:      {}", report.holdouts.len());
    println!(
        "Best steps: {} by {} ({} marks)",
        report.best_steps, report.best_steps_table, report.best_steps_marks
    );
    println!(
        "Best marks: {} by {} ({} steps)",
        report.best_marks, report.best_marks_table, report.best_marks_steps
    );
    println!("Holdouts:");
    for serial in &report.holdouts {
        println!("  {}", serial);
    }

    Ok(())
}

fn json_error(e: serde_json::Error) -> MachineError {
    MachineError::FileError(format!("Failed to render JSON: {}", e))
}
