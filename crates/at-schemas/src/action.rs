use serde::{Deserialize, Serialize};

/// The closed set of actions an agent can claim or execute (§3).
///
/// Closed by design: an unrecognized `type` on disk is a parse error, not a
/// silently-accepted new kind (§7 `UnknownVersion`/`ParseError` discipline
/// extends to this enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "file.read")]
    FileRead,
    #[serde(rename = "file.write")]
    FileWrite,
    #[serde(rename = "file.create")]
    FileCreate,
    #[serde(rename = "file.delete")]
    FileDelete,
    #[serde(rename = "exec.command")]
    ExecCommand,
    #[serde(rename = "exec.script")]
    ExecScript,
    #[serde(rename = "api.call")]
    ApiCall,
    #[serde(rename = "web.fetch")]
    WebFetch,
    #[serde(rename = "web.search")]
    WebSearch,
    #[serde(rename = "web.browse")]
    WebBrowse,
    #[serde(rename = "message.send")]
    MessageSend,
    #[serde(rename = "message.read")]
    MessageRead,
    #[serde(rename = "payment.initiate")]
    PaymentInitiate,
    #[serde(rename = "payment.confirm")]
    PaymentConfirm,
    #[serde(rename = "elevated.enable")]
    ElevatedEnable,
    #[serde(rename = "elevated.disable")]
    ElevatedDisable,
    #[serde(rename = "credential.read")]
    CredentialRead,
    #[serde(rename = "credential.write")]
    CredentialWrite,
    #[serde(rename = "db.query")]
    DbQuery,
    #[serde(rename = "db.write")]
    DbWrite,
    #[serde(rename = "git.commit")]
    GitCommit,
    #[serde(rename = "git.push")]
    GitPush,
    #[serde(rename = "process.spawn")]
    ProcessSpawn,
}

impl ActionType {
    /// "Witnessable" action types per §4.L: these are the kinds for which an
    /// unmatched execution produces a finding at all.
    pub fn is_witnessable(self) -> bool {
        use ActionType::*;
        matches!(
            self,
            FileRead
                | FileWrite
                | FileCreate
                | FileDelete
                | ExecCommand
                | ExecScript
                | ApiCall
                | WebFetch
                | WebSearch
                | WebBrowse
        )
    }

    /// True for the exec.* family, used by §4.L to choose `phantom_process`
    /// over the generic `unwitnessed_execution` finding.
    pub fn is_exec(self) -> bool {
        matches!(self, ActionType::ExecCommand | ActionType::ExecScript)
    }

    /// True for the file.* family consumed by the file correlator (§4.J).
    pub fn is_file(self) -> bool {
        matches!(
            self,
            ActionType::FileRead | ActionType::FileWrite | ActionType::FileCreate | ActionType::FileDelete
        )
    }

    /// True for the URL/hostname-bearing actions consumed by the network
    /// correlator (§4.J).
    pub fn is_network(self) -> bool {
        matches!(
            self,
            ActionType::ApiCall | ActionType::WebFetch | ActionType::WebSearch | ActionType::WebBrowse
        )
    }
}
