//! Account-level JetStream usage.

use crate::api::ApiSubject;
use crate::client::JetStreamManager;
use crate::error::JsmResult;
use crate::options::ManageOpt;
use crate::types::AccountInfo;

impl JetStreamManager {
    /// JetStream usage and limits of the connected account.
    pub async fn account_info(&self, opts: &[ManageOpt]) -> JsmResult<AccountInfo> {
        let opts = self.resolve(opts)?;
        self.api_request(ApiSubject::AccountInfo, Vec::new(), opts.context())
            .await
    }
}
