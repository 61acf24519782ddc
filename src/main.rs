fn main() -> anyhow::Result<()> {
    env_logger::init();
    lotgen::run()?;
    Ok(())
}
