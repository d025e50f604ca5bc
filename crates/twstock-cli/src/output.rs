use crate::cli::OutputFormat;
use crate::commands::Rendered;
use crate::error::CliError;

pub fn render(rendered: &Rendered, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&rendered.envelope)?
            } else {
                serde_json::to_string(&rendered.envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Text => render_text(rendered)?,
    }

    Ok(())
}

fn render_text(rendered: &Rendered) -> Result<(), CliError> {
    let envelope = &rendered.envelope;

    match &rendered.text {
        Some(text) => println!("{text}"),
        None => println!("{}", serde_json::to_string_pretty(&envelope.data)?),
    }

    for warning in &envelope.meta.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &envelope.errors {
        eprintln!("error: {}: {}", error.code, error.message);
    }

    Ok(())
}
