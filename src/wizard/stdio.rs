use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::{
    error::AppError,
    wizard::{
        controller::WizardController,
        protocol::{Outcome, WizardCommand, WizardResponse},
    },
};

/// Serves the wizard protocol over newline-delimited JSON until `reader` ends.
///
/// Malformed lines are answered with an `invalidMessage` response; only I/O
/// failures on the streams themselves end the session early.
pub async fn serve<R, W>(controller: &WizardController, reader: R, mut writer: W) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<WizardCommand>(&line) {
            Ok(command) => {
                debug!(?command, "wizard command received");
                controller.handle(command).await
            }
            Err(err) => WizardResponse::InvalidMessage(Outcome::err(format!("invalid message: {err}"))),
        };

        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }

    debug!("wizard input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use super::*;
    use crate::{
        clipboard::SystemClipboard,
        ssh::{config::SshConfigSynthesizer, gateway::SystemSshGateway},
        storage::MemoryRepository,
    };

    #[tokio::test]
    async fn answers_each_line_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let controller = WizardController::new(
            Arc::new(SystemSshGateway::new(dir.path(), Default::default())),
            Arc::new(SystemClipboard),
            Arc::new(MemoryRepository::default()),
            SshConfigSynthesizer::new(dir.path().join("config"), "~/.ssh"),
        );

        let input = concat!(
            "not json\n",
            "\n",
            "{\"command\": \"testConnection\", \"data\": {}}\n",
            "{\"command\": \"updateSSHConfig\", \"data\": {}}\n",
        );
        let mut output: Vec<u8> = Vec::new();
        serve(&controller, input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["command"], "invalidMessage");
        assert_eq!(responses[1]["command"], "connectionTested");
        assert_eq!(responses[1]["success"], false);
        assert_eq!(responses[2]["command"], "configUpdated");
        assert_eq!(responses[2]["success"], false);
    }
}
