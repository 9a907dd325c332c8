use anyhow::Result;

pub fn check(file: Option<String>) -> Result<()> {
    let (path, config) = super::load(file)?;

    println!("{} is valid", path.display());
    println!("listening on {}", config.server.bind);
    println!("{} token(s)", config.tokens.len());
    for service in config.registry.services.values() {
        let cwd = service
            .cwd
            .as_ref()
            .map_or_else(|| ".".to_owned(), |cwd| cwd.display().to_string());
        println!("  {}: {} (in {cwd})", service.name, service.cmd.join(" "));
    }

    Ok(())
}
