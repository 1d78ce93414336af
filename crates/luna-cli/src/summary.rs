use std::path::Path;

use console::Style;

use luna_core::align::WarpMode;
use luna_core::pipeline::StackerConfig;

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_summary(config: &StackerConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Luna Stacker"));
    println!("  {}", s.title.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"));
    println!();

    println!(
        "  {} {}",
        s.label.apply_to("Input:   "),
        s.path.apply_to(config.input_dir.display())
    );
    println!(
        "  {} {}",
        s.label.apply_to("Output:  "),
        s.path.apply_to(config.output_dir.display())
    );

    let mode = match config.warp_mode {
        WarpMode::Translation => "translation",
        WarpMode::Affine => "affine",
    };
    println!("  {} {}", s.label.apply_to("Warp:    "), s.method.apply_to(mode));
    println!(
        "  {} {} iters, eps {:e}",
        s.label.apply_to("ECC:     "),
        s.value.apply_to(config.ecc_max_iters),
        config.ecc_eps
    );

    if config.use_clahe {
        println!("  {} {}", s.label.apply_to("CLAHE:   "), s.method.apply_to("enabled"));
    } else {
        println!("  {} {}", s.label.apply_to("CLAHE:   "), s.disabled.apply_to("disabled"));
    }
    if config.resize_for_speed != 1.0 {
        println!(
            "  {} {}",
            s.label.apply_to("Resize:  "),
            s.value.apply_to(config.resize_for_speed)
        );
    }
    println!(
        "  {} amount {}, sigma {}",
        s.label.apply_to("Unsharp: "),
        s.value.apply_to(config.unsharp_amount),
        s.value.apply_to(config.gauss_sigma)
    );
    println!();
}

pub fn print_outputs(tiff: &Path, png: &Path) {
    let s = Styles::new();
    println!();
    println!("  {}", s.title.apply_to("Done"));
    println!("  {} {}", s.label.apply_to("16-bit:  "), s.path.apply_to(tiff.display()));
    println!("  {} {}", s.label.apply_to("8-bit:   "), s.path.apply_to(png.display()));
}
