//! Create groups, a 4 × 6 dataset and an attribute, then read the dataset back whole and by
//! quadrant.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ndarray::ArrayView2;
use tracing_subscriber::EnvFilter;

use slabstore::demo::{self, DemoReport};
use slabstore::prelude::*;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Output file
    #[arg(short, long, env = "SLABSTORE_OUTPUT", default_value = "example.h5")]
    output: PathBuf,

    /// Keep everything in memory instead of writing a file
    #[arg(long)]
    memory: bool,
}

fn print(report: &DemoReport) -> anyhow::Result<()> {
    for g in &report.groups {
        println!("Created group: {g}");
    }
    println!("Dataset: {}\n", report.dataset);

    let matrix = ArrayView2::from_shape(report.shape, &report.values)?;
    println!("Matrix data from {}:\n{matrix}\n", report.dataset);

    let [rows, cols] = report.shape;
    println!("Dividing the {rows}x{cols} matrix into four quarters:\n");
    for q in &report.quadrants {
        let count = q.slab.count();
        let values = ArrayView2::from_shape((count[0], count[1]), &q.values)?;
        println!("{} quarter ({}):\n{values}\n", q.quadrant, q.slab);
    }

    println!("Attribute 'dimensions': {:?}", report.dimensions);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let report = if args.memory {
        demo::run(&MemStore::new()).context("running demo in memory")?
    } else {
        let store = H5Store::create(&args.output)
            .with_context(|| format!("creating {:?}", args.output))?;
        let report = demo::run(&store).with_context(|| format!("running demo on {:?}", args.output))?;
        store
            .close()
            .with_context(|| format!("closing {:?}", args.output))?;
        report
    };

    print(&report)?;

    if !args.memory {
        println!("\nWrote {:?}", args.output);
    }

    Ok(())
}
