fn main() -> anyhow::Result<()> {
    statrpc_cli::run_server()
}
