use clap::Parser;
use log::error;

use crate::vm::class_loader::bootstrap::BootClassFinder;
use crate::vm::class_loader::path::PathClassFinder;
use crate::vm::class_loader::{ClassRegistry, CompositeClassFinder};
use crate::vm::interpreter::Interpreter;

mod class_parser;
mod helper;
mod logging;
mod vm;

#[derive(Parser, Debug)]
#[clap(name = "robusta", version, about = "A small class-file interpreter")]
struct VmArgs {
    /// Class search roots, separated by ':'
    #[clap(short, long, default_value = ".")]
    classpath: String,

    /// Qualified name of the class whose main method should run
    main_class: String,
}

fn main() {
    logging::init();

    let args = VmArgs::parse();

    let finder = CompositeClassFinder::new(vec![
        Box::new(BootClassFinder),
        Box::new(PathClassFinder::from_spec(&args.classpath)),
    ]);

    let mut interpreter = Interpreter::new(ClassRegistry::new(finder));
    if let Err(e) = interpreter.run_main(&args.main_class) {
        error!("{}", e);
        std::process::exit(1);
    }
}
