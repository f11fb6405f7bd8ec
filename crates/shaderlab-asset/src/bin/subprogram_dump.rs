use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use shaderlab_asset::{ByteCursor, DecodeOptions, EngineVersion, ShaderProgram};

fn usage() -> &'static str {
    "\
subprogram_dump: decode a decompressed shader sub-program container and print each program

USAGE:
    cargo run -p shaderlab-asset --bin subprogram_dump -- <path.bin> [--version X.Y] [--segment N]
        [--updated-gpu-program] [--no-export]

FLAGS:
    --version X.Y            Engine version the container was written by (default 2019.4)
    --segment N              Segment id the file holds (default 0)
    --updated-gpu-program    Clamp sub-program versions like assets with the updated layout
    --no-export              Only print header fields
"
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = real_main() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn real_main() -> anyhow::Result<()> {
    let mut path: Option<PathBuf> = None;
    let mut options = DecodeOptions::default();
    let mut segment = 0i32;
    let mut export = true;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print!("{}", usage());
                return Ok(());
            }
            "--version" => {
                let Some(v) = args.next() else {
                    bail!("--version requires a value");
                };
                options.engine_version =
                    EngineVersion::parse(&v).with_context(|| format!("invalid --version value {v:?}"))?;
            }
            "--segment" => {
                let Some(v) = args.next() else {
                    bail!("--segment requires a value");
                };
                segment = v
                    .parse::<i32>()
                    .with_context(|| format!("invalid --segment value {v:?}"))?;
            }
            "--updated-gpu-program" => options.has_updated_gpu_program = true,
            "--no-export" => export = false,
            _ if arg.starts_with('-') => {
                bail!("unknown option {arg:?}\n\n{}", usage());
            }
            _ => {
                if path.is_some() {
                    bail!("unexpected positional argument {arg:?}\n\n{}", usage());
                }
                path = Some(PathBuf::from(arg));
            }
        }
    }

    let Some(path) = path else {
        bail!("missing container input path\n\n{}", usage());
    };

    let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let mut r = ByteCursor::new(&bytes);
    let mut program = ShaderProgram::read_index(&mut r, &options).context("read sub-program index")?;
    program
        .read_segment(&mut r, segment)
        .with_context(|| format!("decode segment {segment}"))?;

    println!("{}: {} entries (engine {})", path.display(), program.len(), options.engine_version);
    for (i, entry) in program.entries.iter().enumerate() {
        println!(
            "[{i}] offset={} length={} segment={}",
            entry.offset, entry.length, entry.segment
        );
        if entry.segment != segment {
            continue;
        }
        let sub = program.sub_program(i)?;
        let params = &sub.parameters;
        println!(
            "    version={} type={} code={} bytes keywords={:?} local={:?}",
            sub.version,
            sub.program_type,
            sub.program_code.len(),
            sub.keywords,
            sub.local_keywords.as_deref().unwrap_or_default()
        );
        println!(
            "    cbuffers={} textures={} cb_bindings={} buffers={} uavs={} samplers={} source_map={:#x}",
            params.constant_buffers.len(),
            params.textures.len(),
            params.constant_buffer_bindings.len(),
            params.buffers.len(),
            params.uavs.len(),
            params.samplers.len(),
            sub.bind_channels.source_map
        );
        if export {
            match sub.export() {
                Ok(text) => println!("{text}"),
                Err(err) => println!("    export failed: {err}"),
            }
        }
    }
    Ok(())
}
