use std::path::PathBuf;

const USAGE: &str = "\
Usage: clinical-assessment [--config <path>] [--print-config | --tui-smoke[=page]]

  --config <path>      TOML configuration file (default: ./clinical-assessment.toml if present)
  --print-config       Print the effective configuration and exit
  --tui-smoke[=page]   Render one frame of a page in memory and exit
                       (home|consent|demographics|symptoms|vitals|labs|imaging|review|submitting|results)
";

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print!("{}", USAGE);
        return;
    }

    // --config <path> or --config=<path>
    let config_path: Option<PathBuf> = match args.iter().position(|a| a == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(p) => Some(PathBuf::from(p)),
            None => {
                eprintln!("--config requires a path\n\n{}", USAGE);
                std::process::exit(2);
            }
        },
        None => args
            .iter()
            .find_map(|a| a.strip_prefix("--config="))
            .map(PathBuf::from),
    };

    if args.iter().any(|a| a == "--print-config") {
        clinical_assessment::print_config(config_path.as_deref());
        return;
    }

    // Non-interactive TUI smoke test mode (for automated checks).
    // Usage: --tui-smoke or --tui-smoke=<page>
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        clinical_assessment::run_tui_smoke(target, config_path.as_deref());
        return;
    }

    clinical_assessment::run_tui(config_path.as_deref());
}
