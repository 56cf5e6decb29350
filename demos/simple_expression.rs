use std::collections::HashMap;

use log::debug;

use evalix_rs::functions::default_builder;
use evalix_rs::Arity;

fn main() {
    pretty_env_logger::init();

    let mut builder = default_builder();
    builder
        .dictionary_mut()
        .add_function("square", Arity::Fixed(1), |args| {
            let x = args[0].value()?;
            Ok(x * x)
        })
        .unwrap();
    builder
        .dictionary_mut()
        .add_constant("answer", 42.0)
        .unwrap();

    let expression = builder
        .build("if(price > 100, square(price) / answer, 0)")
        .unwrap();
    debug!("normalized: {expression}");

    for price in [80.0, 120.0] {
        let bindings = HashMap::from([("price".to_string(), price)]);
        let result = expression.evaluate_with(&bindings).unwrap();
        println!("price = {price}: {result}");
    }

    // One-shot form for throwaway input.
    let result = evalix_rs::evaluate_expression("2 + 3 * 4", &HashMap::new()).unwrap();
    println!("2 + 3 * 4 = {result}");
}
