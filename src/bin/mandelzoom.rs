// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate mandelzoom;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use mandelzoom::config::default_workers;
use mandelzoom::{write_frames, DirectorySink, Pipeline, ZoomConfig};
use num::Complex;
use std::str::FromStr;

/// Split `s` at the first `separator` and parse both halves.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let index = s.find(separator)?;
    let left = T::from_str(s[..index].trim()).ok()?;
    let right = T::from_str(s[index + 1..].trim()).ok()?;
    Some((left, right))
}

/// A centre given as `re,im`.
fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex::new(re, im))
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    parse_pair::<T>(s, separator)
        .map(|_| ())
        .ok_or_else(|| err.to_string())
}

/// Accept `s` if it parses and lies in `[low, high]`.  Only
/// `PartialOrd` is asked of `T` because spans and decays are `f64`;
/// a NaN compares false against both bounds and so is rejected.
fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    not_a_number: &str,
    out_of_range: &str,
) -> Result<(), String> {
    let value = T::from_str(s).map_err(|_| not_a_number.to_string())?;
    if value >= low && value <= high {
        Ok(())
    } else {
        Err(out_of_range.to_string())
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const SPAN: &str = "span";
const FRAMES: &str = "frames";
const DECAY: &str = "decay";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const QUEUE_DEPTH: &str = "queue-depth";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get() * 8;

    App::new("mandelzoom")
        .version("0.1.0")
        .author("elf")
        .about("Mandelbrot zoom frame generator")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Directory to write frameNN.txt files into"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1024")
                .validator(|s| {
                    validate_range(
                        &s,
                        1_usize,
                        16_384,
                        "Could not parse frame size",
                        "Frame size must be between 1 and 16384",
                    )
                })
                .help("Samples along each side of a frame"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.5,0.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse centre point"))
                .help("Centre of the zoom on the complex plane"),
        )
        .arg(
            Arg::with_name(SPAN)
                .required(false)
                .long(SPAN)
                .takes_value(true)
                .default_value("3.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        1.0e6,
                        "Could not parse span",
                        "Span must be positive",
                    )
                })
                .help("Width of the first frame on the complex plane"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .required(false)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .default_value("30")
                .validator(|s| {
                    validate_range(
                        &s,
                        1_u32,
                        10_000,
                        "Could not parse frame count",
                        "Frame count must be between 1 and 10000",
                    )
                })
                .help("Number of frames in the zoom"),
        )
        .arg(
            Arg::with_name(DECAY)
                .required(false)
                .long(DECAY)
                .short("d")
                .takes_value(true)
                .default_value("0.9")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        1.0,
                        "Could not parse zoom decay",
                        "Zoom decay must be in (0, 1]",
                    )
                })
                .help("Per-frame shrink factor of the window"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1_u32,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iteration budget per point"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads (default: two per CPU)"),
        )
        .arg(
            Arg::with_name(QUEUE_DEPTH)
                .required(false)
                .long(QUEUE_DEPTH)
                .short("q")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1_usize,
                        std::usize::MAX,
                        "Could not parse queue depth",
                        "Queue depth must be at least 1",
                    )
                })
                .help("Bound both queues to this many entries (default: unbounded)"),
        )
        .get_matches()
}

fn value<'m>(matches: &'m ArgMatches, name: &str) -> &'m str {
    matches.value_of(name).unwrap_or_default()
}

/// Every value has passed its validator by the time we get here.
fn config(matches: &ArgMatches) -> ZoomConfig {
    let parse = |name| value(matches, name);
    let dimension = usize::from_str(parse(SIZE)).unwrap_or(1024);
    ZoomConfig::default()
        .with_dimension(dimension)
        .with_center(parse_complex(parse(CENTER)).unwrap_or_else(|| Complex::new(-0.5, 0.0)))
        .with_span(f64::from_str(parse(SPAN)).unwrap_or(3.0))
        .with_frames(u32::from_str(parse(FRAMES)).unwrap_or(30))
        .with_decay(f64::from_str(parse(DECAY)).unwrap_or(0.9))
        .with_max_iterations(u32::from_str(parse(ITERATIONS)).unwrap_or(1000))
        .with_workers(
            matches
                .value_of(THREADS)
                .and_then(|s| usize::from_str(s).ok())
                .unwrap_or_else(default_workers),
        )
        .with_queue_depth(matches.value_of(QUEUE_DEPTH).and_then(|s| usize::from_str(s).ok()))
}

fn main() -> Result<(), failure::Error> {
    env_logger::init();
    let matches = args();
    let config = config(&matches);

    let mut pipeline = Pipeline::new(config);
    let (frames, stats) = pipeline.run_with_stats()?;

    let mut sink = DirectorySink::new(matches.value_of(OUTPUT).unwrap_or("."))?;
    write_frames(&mut sink, &frames)?;

    println!(
        "{} frames, {} distinct points ({} frame entries), {:.2?}",
        frames.len(),
        stats.points,
        stats.aggregated,
        stats.elapsed
    );
    Ok(())
}
