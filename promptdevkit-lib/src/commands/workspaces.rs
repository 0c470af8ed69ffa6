use super::common::{Common, CommonArgs};
use super::{Host, render};
use crate::Result;
use crate::remote::RemoteSource;
use crate::workspaces::workspaces_options;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser, Debug)]
pub struct WorkspacesArgs {
    /// Print the workspaces as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn process_workspaces<H: Host>(host: &mut H, args: &WorkspacesArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common)?;
    show_workspaces(&mut common, args.json).await
}

pub async fn show_workspaces<H: Host, S: RemoteSource + 'static>(common: &mut Common<'_, H, S>, json: bool) -> Result<()> {
    let options = workspaces_options(Arc::clone(&common.source), &common.session);
    let workspaces = common.fetch(options).await?;

    if json {
        return common.write_json(&*workspaces);
    }

    let mut text = String::new();
    render::workspaces(&mut text, &workspaces, common.use_colors())?;
    common.write_output(&text);
    Ok(())
}
