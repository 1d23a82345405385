use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use qr_anchor::tools::{frame_to_image, load_frame, synthetic_qr};
use qr_anchor::utils::geometry::PerspectiveTransform;
use qr_anchor::{
    DetectorConfig, FinderPatternDetector, PatternDetector, PerspectiveCorrector, Point,
    Quadrilateral, pipeline,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qranchor", version, about = "QR reference target tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate a QR symbol and print its corners
    Detect {
        #[arg(long)]
        image: PathBuf,
    },
    /// Locate a QR symbol and write the rectified reference image
    Rectify {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Rectify hand-picked corners: "x,y x,y x,y x,y" as TL TR BL BR pixels
    Warp {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        corners: String,
    },
    /// Render a synthetic version 1 symbol
    Synth {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 640)]
        width: usize,
        #[arg(long, default_value_t = 480)]
        height: usize,
        #[arg(long, default_value_t = 8)]
        module: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Detect { image } => detect_cmd(&image),
        Command::Rectify { image, out } => rectify_cmd(&image, &out),
        Command::Warp { image, out, corners } => warp_cmd(&image, &out, &corners),
        Command::Synth { out, width, height, module } => synth_cmd(&out, width, height, module),
    }
}

fn load(path: &Path) -> Result<qr_anchor::FrameBuffer> {
    load_frame(path).map_err(|e| anyhow::anyhow!(e)).with_context(|| format!("failed to load {}", path.display()))
}

fn detect_cmd(image: &Path) -> Result<()> {
    let frame = load(image)?;
    println!("Image: {} ({}x{})", image.display(), frame.width(), frame.height());

    let start = Instant::now();
    let observation = FinderPatternDetector::default().detect(&frame)?;
    let elapsed = start.elapsed();

    match observation {
        Some(obs) => {
            let quad = Quadrilateral::from_normalized(&obs, frame.width(), frame.height());
            println!("Found QR symbol in {:.2?}", elapsed);
            for (label, p) in ["top-left", "top-right", "bottom-left", "bottom-right"]
                .iter()
                .zip(quad.corners())
            {
                println!("  {:>12}: ({:.1}, {:.1})", label, p.x, p.y);
            }
        }
        None => println!("No QR symbol found ({:.2?})", elapsed),
    }
    Ok(())
}

fn rectify_cmd(image: &Path, out: &Path) -> Result<()> {
    let frame = load(image)?;
    let config = DetectorConfig::from_env();
    let found = pipeline::process_frame(
        &FinderPatternDetector::default(),
        &PerspectiveCorrector::new(config.max_output_dim),
        &frame,
        config.marker_width,
    )?;

    let (w, h) = found.target.image().dimensions();
    let (pw, ph) = found.target.physical_size();
    found
        .target
        .image()
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} ({}x{}, {:.3} x {:.3} m)", out.display(), w, h, pw, ph);
    Ok(())
}

fn parse_corners(arg: &str) -> Result<Quadrilateral> {
    let points: Vec<Point> = arg
        .split_whitespace()
        .map(|pair| -> Result<Point> {
            let (x, y) = pair.split_once(',').context("corner must be x,y")?;
            Ok(Point::new(x.trim().parse()?, y.trim().parse()?))
        })
        .collect::<Result<_>>()?;
    let [tl, tr, bl, br] = points.as_slice() else {
        bail!("expected 4 corners, got {}", points.len());
    };
    Ok(Quadrilateral::new(*tl, *tr, *bl, *br))
}

fn warp_cmd(image: &Path, out: &Path, corners: &str) -> Result<()> {
    let frame = load(image)?;
    let quad = parse_corners(corners)?;

    const UNIT: [Point; 4] = [
        Point { x: 0.0, y: 0.0 },
        Point { x: 1.0, y: 0.0 },
        Point { x: 0.0, y: 1.0 },
        Point { x: 1.0, y: 1.0 },
    ];
    if let Some(t) = PerspectiveTransform::from_points(&quad.corners(), &UNIT) {
        println!("Homography (quad -> unit square):\n{}", t.matrix());
    }

    let rectified = PerspectiveCorrector::new(DetectorConfig::from_env().max_output_dim).rectify(&quad, &frame)?;
    rectified
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} ({}x{})", out.display(), rectified.width(), rectified.height());
    Ok(())
}

fn synth_cmd(out: &Path, width: usize, height: usize, module: usize) -> Result<()> {
    let side = qr_anchor::tools::VERSION1_MODULES * module;
    if module == 0 || side > width || side > height {
        bail!("a {}px-module symbol does not fit in {}x{}", module, width, height);
    }
    let origin = ((width - side) / 2, (height - side) / 2);
    let qr = synthetic_qr(width, height, origin, module)?;
    frame_to_image(&qr.frame)
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} with symbol corners {:?}", out.display(), qr.corners.corners());
    Ok(())
}
