use stagehand_core::record::decode_batch;

/// `stagehand decode <batch>`: print one record per line.
///
/// Line breaks inside a record are shown as `\n` so each record stays on
/// one output line.
pub fn execute(batch: &str) -> anyhow::Result<()> {
    for line in render(batch)? {
        println!("{line}");
    }
    Ok(())
}

fn render(batch: &str) -> anyhow::Result<Vec<String>> {
    let records = decode_batch(batch)?;
    Ok(records
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{i:>3}  {}", r.replace('\n', "\\n")))
        .collect())
}
