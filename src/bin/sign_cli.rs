#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("sign_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use signsim_engine::geom::GeomMesh;
    use signsim_engine::{SignSimulator, SimulatorConfig, TriangulatorKind};
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const USAGE: &str = r#"sign_cli (signsim-engine)

USAGE:
  sign_cli inspect <descriptor.json> [options]
  sign_cli obj <descriptor.json> --out <path> [options]
  sign_cli tick <descriptor.json> --frame <frame.json> [options]

COMMANDS:
  inspect    Load the sign and print the load report
  obj        Write all trim and cap meshes as one OBJ file
  tick       Push a 512-value JSON array as frame and print the tick report

OPTIONS:
  --out <path>             OBJ output path (obj only)
  --frame <path>           Frame file (tick only)
  --triangulator <kind>    `earclip` (default) or `delaunay`
  --overwrite              Overwrite existing output files
  -h, --help               Show this help
"#;

    struct Options {
        descriptor: PathBuf,
        out: Option<PathBuf>,
        frame: Option<PathBuf>,
        triangulator: TriangulatorKind,
        overwrite: bool,
    }

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "inspect" => cmd_inspect(&parse_options(&mut args)?),
            "obj" => cmd_obj(&parse_options(&mut args)?),
            "tick" => cmd_tick(&parse_options(&mut args)?),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn parse_options(args: &mut Args) -> Result<Options, String> {
        let descriptor = PathBuf::from(args.next().ok_or("missing descriptor path")?);
        let mut options = Options {
            descriptor,
            out: None,
            frame: None,
            triangulator: TriangulatorKind::EarClip,
            overwrite: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out" => options.out = Some(PathBuf::from(args.value("--out")?)),
                "--frame" => options.frame = Some(PathBuf::from(args.value("--frame")?)),
                "--triangulator" => {
                    options.triangulator = match args.value("--triangulator")?.as_str() {
                        "earclip" => TriangulatorKind::EarClip,
                        "delaunay" => TriangulatorKind::Delaunay,
                        other => return Err(format!("unknown triangulator `{other}`")),
                    };
                }
                "--overwrite" => options.overwrite = true,
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }
        Ok(options)
    }

    fn load(options: &Options) -> Result<SignSimulator, String> {
        let json = fs::read_to_string(&options.descriptor)
            .map_err(|e| format!("read {}: {e}", options.descriptor.display()))?;
        let config = SimulatorConfig {
            triangulator: options.triangulator,
            ..SimulatorConfig::default()
        };
        let mut simulator = SignSimulator::new(config).map_err(|e| e.to_string())?;
        let report = simulator.load_sign_str(&json).map_err(|e| e.to_string())?;

        eprintln!(
            "{}: groups={} bulbs={} caps={} bands={} | {}",
            options.descriptor.display(),
            report.assembly.group_count,
            report.bulb_count,
            report.assembly.cap_count,
            report.assembly.extrusion_count,
            report.assembly.diagnostics.summary()
        );
        for warning in &report.assembly.warnings {
            eprintln!("warning: {warning}");
        }
        Ok(simulator)
    }

    fn cmd_inspect(options: &Options) -> Result<(), String> {
        let simulator = load(options)?;
        let report = simulator
            .diagnostics()
            .ok_or("no load report available")?;
        let json = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
        println!("{json}");
        print!("{}", report.assembly.diagnostics);
        Ok(())
    }

    fn cmd_obj(options: &Options) -> Result<(), String> {
        let path = options.out.as_deref().ok_or("obj requires --out <path>")?;
        let simulator = load(options)?;
        let scene = simulator.scene();

        let mut objects = Vec::new();
        for node in scene.nodes() {
            let Some(signsim_engine::scene::Renderable::Mesh { mesh, .. }) = node.renderable.as_ref()
            else {
                continue;
            };
            let offset = scene
                .world_translation(node.id)
                .ok_or_else(|| format!("node {} lost its parent", node.name))?;
            objects.push((node.name.as_str(), mesh, offset));
        }

        write_obj_file(path, &objects, options.overwrite)?;
        eprintln!("wrote {} ({} objects)", path.display(), objects.len());
        Ok(())
    }

    fn cmd_tick(options: &Options) -> Result<(), String> {
        let frame_path = options.frame.as_deref().ok_or("tick requires --frame <path>")?;
        let text = fs::read_to_string(frame_path)
            .map_err(|e| format!("read {}: {e}", frame_path.display()))?;
        let values: Vec<f64> = serde_json::from_str(&text)
            .map_err(|e| format!("parse {}: {e}", frame_path.display()))?;

        let mut simulator = load(options)?;
        simulator.push_frame(&values).map_err(|e| e.to_string())?;
        let report = simulator.tick();
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{json}");
        Ok(())
    }

    fn write_obj_file(
        path: &Path,
        objects: &[(&str, &GeomMesh, [f64; 3])],
        overwrite: bool,
    ) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        writeln!(w, "# signsim-engine sign_cli").map_err(|e| format!("write obj: {e}"))?;

        // OBJ indices are global and 1-based.
        let mut base = 1u32;
        for (name, mesh, offset) in objects {
            mesh.validate()
                .map_err(|e| format!("mesh {name} validation failed: {e}"))?;
            writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

            for p in mesh.positions.iter().copied() {
                writeln!(w, "v {} {} {}", p[0] + offset[0], p[1] + offset[1], p[2] + offset[2])
                    .map_err(|e| format!("write obj: {e}"))?;
            }
            for n in mesh.normals.iter().copied() {
                writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(|e| format!("write obj: {e}"))?;
            }
            for tri in mesh.indices.chunks_exact(3) {
                let a = tri[0] + base;
                let b = tri[1] + base;
                let c = tri[2] + base;
                writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}").map_err(|e| format!("write obj: {e}"))?;
            }

            let count = u32::try_from(mesh.vertex_count())
                .map_err(|_| format!("mesh {name} has too many vertices"))?;
            base += count;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
