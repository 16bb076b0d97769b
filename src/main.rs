fn main() -> anyhow::Result<()> {
    speakwise::run()
}
