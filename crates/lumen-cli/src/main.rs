//! lumen CLI - build acceleration structures over procedural scenes and
//! trace rays through them.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lumen_accel::{Accelerator, AcceleratorConfig, BvhConfig, BvhStats, KdTreeConfig, KdTreeStats, SplitMethod};
use lumen_shapes::{LinearAggregate, Primitive};
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod scene;

use scene::SceneFile;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Ray-tracing acceleration structure toolkit", long_about = None)]
struct Cli {
    /// Log build details (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the configured accelerator and trace one ray per pixel
    Trace {
        /// Scene file (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check every accelerator against brute force on random rays
    Verify {
        /// Scene file (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// Number of random rays
        #[arg(long, default_value_t = 10_000)]
        rays: usize,
        /// Seed for the random rays
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print build statistics for the configured accelerator
    Info {
        /// Scene file (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Trace { config, json } => trace(&config, json),
        Commands::Verify { config, rays, seed } => verify(&config, rays, seed),
        Commands::Info { config, json } => info(&config, json),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StatsReport {
    Bvh(BvhStats),
    KdTree(KdTreeStats),
}

impl StatsReport {
    fn of(accel: &Accelerator) -> Self {
        match accel {
            Accelerator::Bvh(bvh) => StatsReport::Bvh(*bvh.stats()),
            Accelerator::KdTree(kd) => StatsReport::KdTree(*kd.stats()),
        }
    }
}

#[derive(Debug, Serialize)]
struct TraceReport {
    primitives: usize,
    accelerator: &'static str,
    build_ms: f64,
    trace_ms: f64,
    rays: usize,
    hits: usize,
    mrays_per_sec: f64,
    stats: StatsReport,
}

fn build_timed(file: &SceneFile) -> (Accelerator, usize, f64) {
    let prims = file.scene.build();
    let count = prims.len();
    let start = Instant::now();
    let accel = Accelerator::build(prims, &file.accelerator);
    let build_ms = start.elapsed().as_secs_f64() * 1e3;
    tracing::info!(
        accelerator = accel.name(),
        primitives = count,
        build_ms,
        "built accelerator"
    );
    (accel, count, build_ms)
}

fn trace(path: &Path, json: bool) -> Result<()> {
    let file = SceneFile::load(path)?;
    let (accel, primitives, build_ms) = build_timed(&file);

    let rays = file.camera.primary_rays(&accel.world_bound());
    let start = Instant::now();
    let mut hits = 0;
    for ray in &rays {
        let mut ray = *ray;
        if accel.intersect(&mut ray).is_some() {
            hits += 1;
        }
    }
    let trace_secs = start.elapsed().as_secs_f64();

    let report = TraceReport {
        primitives,
        accelerator: accel.name(),
        build_ms,
        trace_ms: trace_secs * 1e3,
        rays: rays.len(),
        hits,
        mrays_per_sec: if trace_secs > 0.0 {
            rays.len() as f64 / trace_secs / 1e6
        } else {
            0.0
        },
        stats: StatsReport::of(&accel),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Scene:       {} primitives", report.primitives);
        println!("Accelerator: {}", report.accelerator);
        println!("Build:       {:.2} ms", report.build_ms);
        println!(
            "Trace:       {} rays, {} hits in {:.2} ms ({:.2} Mrays/s)",
            report.rays, report.hits, report.trace_ms, report.mrays_per_sec
        );
        print_stats(&report.stats);
    }
    Ok(())
}

fn verify(path: &Path, ray_count: usize, seed: u64) -> Result<()> {
    let file = SceneFile::load(path)?;
    let prims = file.scene.build();
    let oracle = LinearAggregate::new(prims.clone());
    let rays = scene::random_rays(&oracle.world_bound(), ray_count, seed);

    let mut candidates = vec![
        ("configured", file.accelerator.clone()),
        ("kdtree", AcceleratorConfig::KdTree(KdTreeConfig::default())),
    ];
    for split_method in [SplitMethod::Sah, SplitMethod::Middle, SplitMethod::EqualCounts] {
        candidates.push((
            split_method.as_str(),
            AcceleratorConfig::Bvh(BvhConfig {
                split_method,
                ..BvhConfig::default()
            }),
        ));
    }

    let expected: Vec<Option<f64>> = rays
        .iter()
        .map(|r| {
            let mut r = *r;
            oracle.intersect(&mut r).map(|h| h.t)
        })
        .collect();

    let mut failures = 0;
    for (label, config) in &candidates {
        let accel = Accelerator::build(prims.clone(), config);
        let mut mismatches = 0;
        for (i, (ray, want)) in rays.iter().zip(&expected).enumerate() {
            let mut trial = *ray;
            let got = accel.intersect(&mut trial).map(|h| h.t);
            if got != *want || accel.intersect_p(ray) != want.is_some() {
                if mismatches == 0 {
                    tracing::error!(label = *label, ray = i, ?got, ?want, "first mismatch");
                }
                mismatches += 1;
            }
        }
        println!(
            "{:<12} {:<7} {} / {} rays agree",
            label,
            accel.name(),
            rays.len() - mismatches,
            rays.len()
        );
        failures += mismatches;
    }

    anyhow::ensure!(failures == 0, "{failures} rays disagreed with brute force");
    println!("All accelerators agree with brute force.");
    Ok(())
}

fn info(path: &Path, json: bool) -> Result<()> {
    let file = SceneFile::load(path)?;
    let (accel, _, _) = build_timed(&file);
    let stats = StatsReport::of(&accel);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("serializing statistics")?
        );
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn print_stats(stats: &StatsReport) {
    match stats {
        StatsReport::Bvh(s) => {
            println!("BVH:");
            println!("  Primitives:      {}", s.total_primitives);
            println!(
                "  Nodes:           {} ({} interior, {} leaves)",
                s.total_nodes, s.interior_nodes, s.leaf_nodes
            );
            println!("  Max leaf size:   {}", s.max_leaf_primitives);
            println!("  Avg leaf size:   {:.2}", s.avg_leaf_primitives());
            println!("  Max depth:       {}", s.max_depth);
            println!("  Memory:          {} KiB", s.memory_bytes / 1024);
        }
        StatsReport::KdTree(s) => {
            println!("K-d tree:");
            println!("  Primitives:      {}", s.total_primitives);
            println!(
                "  Nodes:           {} ({} leaves, {} empty)",
                s.nodes, s.leaves, s.empty_leaves
            );
            println!("  Primitive refs:  {}", s.primitive_refs);
            println!("  Max leaf size:   {}", s.max_leaf_primitives);
            println!("  Avg leaf size:   {:.2}", s.avg_leaf_primitives());
            println!("  Depth:           {} (limit {})", s.depth_reached, s.max_depth);
            println!("  Memory:          {} KiB", s.memory_bytes / 1024);
        }
    }
}
