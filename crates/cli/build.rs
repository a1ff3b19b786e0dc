use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("quizsift")
        .version("0.1.0")
        .author("Quizsift Contributors")
        .about("Extract quiz questions from web pages")
        .arg(
            clap::arg!([SOURCE] ... "URLs or local HTML files to process, or '-' to read a URL list from stdin")
                .value_name("SOURCE"),
        )
        .arg(
            clap::arg!(-i --input <FILE> "File with one URL per line")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-o --out_dir <DIR> "Directory for questions_main.txt and questions_undetected.txt")
                .value_name("DIR")
                .default_value(".")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--json "Print the JSON export to stdout instead of writing text files"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds, per attempt").default_value("30"))
        .arg(clap::arg!(--attempts <NUM> "Attempts per URL before giving up").default_value("3"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--max_options <NUM> "Render at most this many options per question"))
        .arg(clap::arg!(-y --yes "Start processing without asking for confirmation"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "quizsift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "quizsift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "quizsift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "quizsift", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
