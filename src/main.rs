//! # Stratalog REPL
//!
//! A Read-Eval-Print Loop over the Datalog-native statement syntax
//! (`statement::parse_statement`): facts, rules, queries, and meta
//! commands. Parsing and surface syntax are named but out-of-scope
//! interfaces around the control-flow IR and slab storage core; this REPL
//! exercises exactly that surface without driving either core.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin stratalog
//! ```
//!
//! Enter Datalog statements or commands:
//! - `+edge(1, 2).` - insert a fact
//! - `?- edge(X, Y).` - query
//! - `.help` - show this help
//! - `.quit` - exit

use stratalog::{parse_statement, Statement};
use std::io::{self, Write};

fn print_help() {
    println!("\nCommands:");
    println!("  +relation(args).     insert a fact");
    println!("  -relation(args).     delete a fact");
    println!("  name :- body.        define a rule");
    println!("  ?- goal.             run a query");
    println!("  .help                show this help");
    println!("  .quit / .exit        exit\n");
}

fn main() {
    println!("Stratalog REPL");
    println!("==============\n");
    print_help();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == ".quit" || input == ".exit" {
            println!("Goodbye!");
            break;
        }
        if input == ".help" {
            print_help();
            continue;
        }

        match parse_statement(input) {
            Ok(Statement::Fact(rule)) => println!("parsed fact: {rule:?}"),
            Ok(Statement::Insert(op)) => println!("parsed insert: {op:?}"),
            Ok(Statement::Delete(op)) => println!("parsed delete: {op:?}"),
            Ok(Statement::Query(goal)) => println!("parsed query: {goal:?}"),
            Ok(Statement::SessionRule(rule)) | Ok(Statement::PersistentRule(rule)) => {
                println!("parsed rule: {rule:?}");
            }
            Ok(other) => println!("parsed: {other:?}"),
            Err(e) => println!("parse error: {e}"),
        }
    }
}
