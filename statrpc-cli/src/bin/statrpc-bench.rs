fn main() -> anyhow::Result<()> {
    statrpc_cli::run_bench()
}
