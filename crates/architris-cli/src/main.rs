mod board_text;
mod command;
mod level_pack;
mod progress_store;
mod schema;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
