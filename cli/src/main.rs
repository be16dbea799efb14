use clap::{App, AppSettings, Arg, ArgMatches, Error, ErrorKind, SubCommand, app_from_crate,
           crate_authors, crate_description, crate_name, crate_version, value_t};
use env_logger::Env;
use log::debug;
use serde::Serialize;

use turnip_predict_lib::{observations_from_sales, slot_label, Pattern, Pinning, Prediction,
                         Predictor, SimulatedWeek, Simulator, Xorshift, DEFAULT_SEED};

// Subcommand names.
const PREDICT: &str = "predict";
const SIMULATE: &str = "simulate";

// Argument names.
const BASE_PRICE: &str = "BASE_PRICE";
const PRICES: &str = "PRICES";
const PATTERN: &str = "pattern";
const STRICT: &str = "strict";
const FIRST_BUY: &str = "first_buy";
const SEED: &str = "seed";
const PREVIOUS: &str = "previous";
const COUNT: &str = "count";
const JSON: &str = "json";
const DEBUG: &str = "DEBUG";

// Argument values.
const MISSING_PRICE: &str = "?";
const MIN_BASE_PRICE: u32 = 90;
const MAX_BASE_PRICE: u32 = 110;

fn pattern_arg(name: &'static str) -> Arg<'static, 'static> {
    Arg::with_name(name)
        .takes_value(true)
        .value_name("PATTERN")
}

fn json_arg() -> Arg<'static, 'static> {
    Arg::with_name(JSON)
        .help("Print results as JSON.")
        .long("json")
}

fn debug_arg() -> Arg<'static, 'static> {
    Arg::with_name(DEBUG)
        .help("Enable debug logging. RUST_LOG takes precedence.")
        .short("d")
        .long("debug")
}

fn cli() -> App<'static, 'static> {
    // Hack to make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    app_from_crate!()
        .after_help("Turnip prices follow one of four weekly patterns, generated \
        from the game's own random number sequence. The predict subcommand \
        works out the range every remaining slot can still take, and the \
        simulate subcommand replays the game's generator.\n\n\
        Example usage: turnip-predict predict 100 --pattern decreasing 90 86 ? 80")
        .max_term_width(80)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(SubCommand::with_name(PREDICT)
            .about("Predict the rest of the week from observed prices.")
            .arg(Arg::with_name(BASE_PRICE)
                .help("The price you bought turnips for on Sunday.")
                .takes_value(true)
                .required(true))
            .arg(Arg::with_name(PRICES)
                .help("The sell prices observed so far, from Monday morning. \
                       Missed prices can be replaced with '?'.")
                .takes_value(true)
                .multiple(true)
                .min_values(0)
                .max_values(12))
            .arg(pattern_arg(PATTERN)
                .help("Only consider this pattern: fluctuating, largespike, \
                       decreasing or smallspike.")
                .short("p")
                .long("pattern"))
            .arg(pattern_arg(PREVIOUS)
                .help("Last week's pattern, used to weigh the chance of each pattern.")
                .short("l")
                .long("previous"))
            .arg(Arg::with_name(STRICT)
                .help("Rule out patterns the observed prices contradict.")
                .long("strict"))
            .arg(Arg::with_name(FIRST_BUY)
                .help("This is the first week you have bought turnips.")
                .long("first-buy"))
            .arg(json_arg())
            .arg(debug_arg()))
        .subcommand(SubCommand::with_name(SIMULATE)
            .about("Generate weeks exactly as the game does.")
            .arg(Arg::with_name(SEED)
                .help("Seed for the random number generator.")
                .short("s")
                .long("seed")
                .takes_value(true))
            .arg(pattern_arg(PREVIOUS)
                .help("Last week's pattern, which biases the first generated week.")
                .long("previous"))
            .arg(Arg::with_name(COUNT)
                .help("Number of consecutive weeks to generate.")
                .short("n")
                .long("count")
                .takes_value(true)
                .default_value("1"))
            .arg(json_arg())
            .arg(debug_arg()))
}

fn main() {
    let args = cli().get_matches();
    let result = match args.subcommand() {
        (PREDICT, Some(args)) => {
            init_logging(args);
            run_predict(args)
        }
        (SIMULATE, Some(args)) => {
            init_logging(args);
            run_simulate(args)
        }
        _ => unreachable!(),
    };
    if let Err(e) = result {
        e.exit();
    }
}

fn init_logging(args: &ArgMatches) {
    let level = if args.is_present(DEBUG) { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn run_predict(args: &ArgMatches) -> Result<(), Error> {
    let base_price = parse_base_price(args)?;
    let hint = parse_pattern(args.value_of(PATTERN))?;
    let previous = parse_pattern(args.value_of(PREVIOUS))?;
    let prices = match args.values_of(PRICES) {
        Some(values) => parse_prices(values)?,
        None => Vec::new(),
    };
    let observations = observations_from_sales(&prices)
        .map_err(|e| Error::value_validation_auto(e.to_string()))?;
    let pinning = if args.is_present(STRICT) { Pinning::Strict } else { Pinning::Permissive };
    debug!("predict: base {} hint {:?} {:?} prices {:?}", base_price, hint, pinning, prices);

    let prediction = Predictor::new()
        .hint(hint)
        .pinning(pinning)
        .first_buy(args.is_present(FIRST_BUY))
        .predict(base_price, &observations);

    if args.is_present(JSON) {
        println!("{}", to_json(&prediction)?);
    } else {
        print_prediction(&prediction, previous);
    }
    Ok(())
}

fn run_simulate(args: &ArgMatches) -> Result<(), Error> {
    let seed = if args.is_present(SEED) { value_t!(args, SEED, u32)? } else { DEFAULT_SEED };
    let count = value_t!(args, COUNT, usize)?;
    let mut previous = parse_pattern(args.value_of(PREVIOUS))?;

    let mut rng = Xorshift::new(seed);
    let mut simulator = Simulator::new(&mut rng);
    let mut weeks = Vec::with_capacity(count);
    let mut priors = Vec::with_capacity(count);
    for _ in 0..count {
        let week = simulator.generate(previous);
        priors.push(week.pattern.transition_chance(previous));
        previous = Some(week.pattern);
        weeks.push(week);
    }

    if args.is_present(JSON) {
        println!("{}", to_json(&weeks)?);
    } else {
        for (i, (week, prior)) in weeks.iter().zip(priors).enumerate() {
            if i > 0 {
                println!();
            }
            print_week(week, prior);
        }
    }
    Ok(())
}

fn parse_base_price(args: &ArgMatches) -> Result<u32, Error> {
    let price = value_t!(args, BASE_PRICE, u32)?;
    if !(MIN_BASE_PRICE..=MAX_BASE_PRICE).contains(&price) {
        let msg = format!("The base price should be between {} and {}, got {}",
                          MIN_BASE_PRICE, MAX_BASE_PRICE, price);
        return Err(Error::value_validation_auto(msg));
    }
    Ok(price)
}

fn parse_pattern(value: Option<&str>) -> Result<Option<Pattern>, Error> {
    value.map(|val| val.parse::<Pattern>())
        .transpose()
        .map_err(|e| Error::value_validation_auto(e.to_string()))
}

fn parse_prices<'a, I: IntoIterator<Item = &'a str>>(args: I) -> Result<Vec<Option<u32>>, Error> {
    let mut prices = Vec::new();
    for arg in args {
        if arg == MISSING_PRICE {
            prices.push(None);
        } else {
            let price = arg.parse::<u32>().map_err(|_| {
                let msg = format!(
                    "The argument '{}' should be a non-negative integer or \
                     the character '?'", arg);
                Error::value_validation_auto(msg)
            })?;
            prices.push(Some(price));
        }
    }
    Ok(prices)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::with_description(&e.to_string(), ErrorKind::Format))
}

fn print_prediction(prediction: &Prediction, previous: Option<Pattern>) {
    if prediction.combinations() == 0 {
        println!("These prices did not match any known pattern. Either your \
                  numbers are wrong, or the week was not generated by the game.");
        return;
    }

    println!("Most likely: {}", prediction.pattern);
    for (pattern, count) in prediction.pattern_counts.iter() {
        println!("  {}: {} of {} (prior {:.0}%)", pattern, count, prediction.combinations(),
                 pattern.transition_chance(previous) * 100.0);
    }
    if prediction.tolerance > 0 {
        println!("Matched within {} bells.", prediction.tolerance);
    }

    println!();
    for (slot, bound) in prediction.bounds.iter().enumerate() {
        println!("{:<7} {:>9}", slot_label(slot), bound.to_string());
    }
    println!("Range: {}", prediction.sale_range());
}

fn print_week(week: &SimulatedWeek, prior: f64) {
    println!("{} week ({:.0}% likely), bought at {} bells", week.pattern, prior * 100.0,
             week.purchase_price);
    for (slot, price) in week.slots.iter().enumerate() {
        println!("{:<7} {:>4}", slot_label(slot), price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(args: &[&str]) -> Result<ArgMatches<'static>, Error> {
        let mut full = vec!["turnip-predict"];
        full.extend_from_slice(args);
        cli().get_matches_from_safe(full)
    }

    fn predict_args(args: &[&str]) -> ArgMatches<'static> {
        let mut full = vec![PREDICT];
        full.extend_from_slice(args);
        let all = matches(&full).unwrap();
        all.subcommand_matches(PREDICT).unwrap().clone()
    }

    #[test]
    fn test_parse_prices() {
        let prices = parse_prices(vec!["90", "?", "85"]).unwrap();
        assert_eq!(prices, vec![Some(90), None, Some(85)]);
        assert!(parse_prices(vec!["90", "-3"]).is_err());
        assert!(parse_prices(vec!["many"]).is_err());
    }

    #[test]
    fn test_parse_pattern() {
        assert_eq!(parse_pattern(None).unwrap(), None);
        assert_eq!(parse_pattern(Some("LargeSpike")).unwrap(), Some(Pattern::LargeSpike));
        assert_eq!(parse_pattern(Some("random")).unwrap(), Some(Pattern::Fluctuating));
        let err = parse_pattern(Some("sideways")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueValidation);
    }

    #[test]
    fn test_base_price_range() {
        assert_eq!(parse_base_price(&predict_args(&["100"])).unwrap(), 100);
        let err = parse_base_price(&predict_args(&["111"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueValidation);
        assert!(parse_base_price(&predict_args(&["cheap"])).is_err());
    }

    #[test]
    fn test_predict_arguments() {
        let args = predict_args(&["104", "90", "?", "86", "--strict", "-p", "largespike"]);
        assert!(args.is_present(STRICT));
        assert!(!args.is_present(FIRST_BUY));
        assert_eq!(args.value_of(PATTERN), Some("largespike"));
        assert_eq!(args.value_of(PREVIOUS), None);
        let prices = parse_prices(args.values_of(PRICES).unwrap()).unwrap();
        assert_eq!(prices, vec![Some(90), None, Some(86)]);
    }

    #[test]
    fn test_predict_previous_pattern() {
        let args = predict_args(&["100", "-l", "decreasing", "90"]);
        let previous = parse_pattern(args.value_of(PREVIOUS)).unwrap();
        assert_eq!(previous, Some(Pattern::Decreasing));
        assert_eq!(Pattern::LargeSpike.transition_chance(previous), 0.45);
        let prices = parse_prices(args.values_of(PRICES).unwrap()).unwrap();
        assert_eq!(prices, vec![Some(90)]);
    }

    #[test]
    fn test_too_many_prices() {
        let mut args = vec![PREDICT, "100"];
        args.extend(std::iter::repeat("90").take(13));
        assert!(matches(&args).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(matches(&[]).is_err());
    }

    #[test]
    fn test_simulate_defaults() {
        let all = matches(&[SIMULATE]).unwrap();
        let args = all.subcommand_matches(SIMULATE).unwrap();
        assert!(!args.is_present(SEED));
        assert_eq!(value_t!(args, COUNT, usize).unwrap(), 1);
    }
}
