use std::io::{self, BufRead, Write};

use calcore::{format_result, register_functions, EvalError, Interpreter};

fn build_interpreter() -> Result<Interpreter, EvalError> {
    let mut interpreter = Interpreter::new();
    register_functions(&mut interpreter)?;
    interpreter.declare_variable("PI")?;
    interpreter.write_variable("PI", std::f64::consts::PI)?;
    Ok(interpreter)
}

fn main() {
    pretty_env_logger::init();

    let mut interpreter = match build_interpreter() {
        Ok(interpreter) => interpreter,
        Err(error) => {
            eprintln!("ERROR: {error}");
            return;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let expression = args.join(" ");
        report(interpreter.eval(&expression));
        return;
    }

    println!("Enter an expression, for example: (1+2)*sqrt(2)");
    let stdin = io::stdin();
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let expression = line.trim();
        if expression.is_empty() || expression == "exit" {
            break;
        }
        report(interpreter.eval(expression));
    }
}

fn report(result: Result<f64, EvalError>) {
    match result {
        Ok(value) => println!("{}", format_result(value)),
        Err(error) => println!("ERROR: {error}"),
    }
}
