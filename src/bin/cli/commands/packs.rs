use anyhow::Result;

use cardpacks_lib::practice::PackKind;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let store = app.load_pack_store()?;
    let counts = store.counts();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "dataDir": app.data_dir.to_string_lossy(),
                "packs": counts,
                "deletedCount": store.deleted_ids.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Packs in {}", app.data_dir.display());
            for pack in PackKind::ALL {
                println!("  {:<10} {:>4} cards", pack.label(), counts.get(pack));
            }
            println!("  {:<10} {:>4} cards", "Deleted", store.deleted_ids.len());
        }
    }

    Ok(())
}
