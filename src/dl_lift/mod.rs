use crate::filter::MethodFilter;
use crate::prelude::*;
use crate::unitfile;
use clap::ArgMatches;
use dl_ir::controlflow::StmtGraph;
use nu_ansi_term::Color;
use std::fs::{create_dir_all, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn run(args: &ArgMatches) -> DlResult<()> {
    init_logger(args);

    let input_fname = args
        .get_one::<String>("input")
        .ok_or_else(|| DlError::BadArguments("--input needed".to_string()))?;
    let repo = unitfile::load(input_fname)?;
    let filter = MethodFilter::from_args(args)?;

    let options = LiftOptions::new().with_typing(!args.get_flag("no-typing"));
    if !options.typing() {
        log::info!("typing disabled");
    }

    let mut unit = TranslationUnit::new(&repo, options);
    for method in filter.select(&repo) {
        unit.add(method);
    }
    let lifted = unit.finish();

    match args.get_one::<String>("output") {
        Some(output_fname) => {
            let mut output = BufWriter::new(File::create(output_fname)?);
            write_bodies(&mut output, &lifted)?;
            output.flush()?;
        }
        None => write_bodies(&mut io::stdout().lock(), &lifted)?,
    }

    if let Some(cfg_dir) = args.get_one::<String>("cfg") {
        for (_, body) in lifted.iter_bodies() {
            let path = write_cfg_file(cfg_dir, body)?;
            log::debug!("control flow graph written to {}", path.display());
        }
    }

    for (signature, err) in lifted.iter_failures() {
        eprintln!("{}", Color::Red.paint(format!("[!] {signature}: {err}")));
    }
    log::info!("");
    log::info!(
        "lifted methods: {} / {}",
        lifted.nb_bodies(),
        lifted.nb_bodies() + lifted.nb_failures()
    );

    let (_, failures) = lifted.into_parts();
    match failures.into_values().last() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn write_bodies<W: Write>(out: &mut W, lifted: &LiftedUnit) -> DlResult<()> {
    for (signature, body) in lifted.iter_bodies() {
        log::debug!("writing body of {signature}");
        writeln!(out, "{body}")?;
    }
    Ok(())
}

/// Writes the statement graph of `body` to `base_dir/<class>/<method>.dot`.
fn write_cfg_file<P: AsRef<Path>>(base_dir: P, body: &Body) -> DlResult<PathBuf> {
    let mut path = base_dir.as_ref().to_path_buf();
    path.push(body.method.class.to_java_string());
    create_dir_all(&path)?;

    path.push(format!("{}.dot", body.method.subsignature().replace('/', ".")));
    let mut file = File::create(&path)?;
    file.write_all(StmtGraph::build(body).to_dot(body).as_bytes())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: &str = r#"{
        "classes": [{
            "name": "a/C",
            "methods": [{ "name": "id", "proto": "(I)I", "flags": ["static"] }]
        }],
        "bodies": [{
            "class": "a/C",
            "method": "id(I)I",
            "code": { "registers_size": 1, "ins_size": 1, "insns": [15] }
        }]
    }"#;

    fn lift_all(repo: &Repo) -> LiftedUnit {
        let filter = MethodFilter::default();
        let mut unit = TranslationUnit::new(repo, LiftOptions::default());
        for method in filter.select(repo) {
            unit.add(method);
        }
        unit.finish()
    }

    #[test]
    fn bodies_listing() {
        let repo = unitfile::load_str(UNIT).unwrap();
        let lifted = lift_all(&repo);
        assert_eq!(lifted.nb_failures(), 0);

        let mut out = Vec::new();
        write_bodies(&mut out, &lifted).unwrap();
        let listing = String::from_utf8(out).unwrap();
        assert!(listing.starts_with("method La/C;->id(I)I {"));
        assert!(listing.contains("    int v0;"));
    }

    #[test]
    fn cfg_files() {
        let repo = unitfile::load_str(UNIT).unwrap();
        let lifted = lift_all(&repo);
        let (_, body) = lifted.iter_bodies().next().unwrap();

        let dir = std::env::temp_dir().join(format!("dl-lift-cfg-{}", std::process::id()));
        let path = write_cfg_file(&dir, body).unwrap();
        assert_eq!(path, dir.join("a.C").join("id(I)I.dot"));
        let dot = std::fs::read_to_string(&path).unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("label=\"0000 [0]\""));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
