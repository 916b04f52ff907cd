fn main() -> anyhow::Result<()> {
    buildsync::cli::main()
}
