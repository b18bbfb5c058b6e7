use anyhow::Result;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::InspectArgs) -> Result<()> {
    for path in &args.inputs {
        let summary = admintopo::inspect(path)?;
        println!("{}", path.display());
        print!("{summary}");
    }
    Ok(())
}
