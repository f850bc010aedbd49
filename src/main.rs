mod cli;

fn main() -> anyhow::Result<()> {
    cli::setup_logging();
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
