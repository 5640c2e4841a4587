//! `olive` command line.
//!
//! ```bash
//! olive campaigns list
//! olive campaigns create --name "Sale Outreach" --type OUTBOUND --prompt "Greet and pitch"
//! olive campaigns update cmp-1 --agent-config '{"temperature": 0.4}' --customer-set cs-1
//! olive campaigns start cmp-1
//! olive customer-sets upload --name "June leads" leads.csv
//! olive calls transcript call-1
//! olive services agents create --name "Maya" --config '{"model": "enhanced"}'
//! olive test-call --mobile 9876543210 --name Asha --company Acme --product "Solar panels"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use olive_core::call::render_transcript;
use olive_core::campaign_form::CampaignForm;
use olive_core::channel::ChannelSlot;
use olive_core::customer::{CreateCustomer, UpdateCustomer};
use olive_core::customer_set::{CustomerSetForm, CustomerSetType, UploadFile};
use olive_core::lifecycle::CampaignAction;
use olive_core::service::{CreateService, ServiceKind, UpdateService};
use olive_core::test_call::{InterruptSensitivity, SynthesizerKind, TestCallForm, DEFAULT_VOICE};

use crate::config::{ClientConfig, ConfigError};
use crate::dashboard::Dashboard;
use crate::session::{SessionProvider, SessionStore};

#[derive(Debug, Parser)]
#[command(name = "olive", version, about = "Olive campaign platform command line", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides OLIVE_BACKEND_URL)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Bearer token (overrides OLIVE_ACCESS_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Organization new records are created under (overrides OLIVE_ORGANIZATION_ID)
    #[arg(long, global = true)]
    pub organization_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage campaigns
    Campaigns {
        #[command(subcommand)]
        action: CampaignCommand,
    },
    /// Manage customer sets
    CustomerSets {
        #[command(subcommand)]
        action: CustomerSetCommand,
    },
    /// Manage customers
    Customers {
        #[command(subcommand)]
        action: CustomerCommand,
    },
    /// Inspect call logs
    Calls {
        #[command(subcommand)]
        action: CallCommand,
    },
    /// Manage agents, synthesizers, transcribers and telephony services
    Services {
        /// agent(s), synthesizer(s), transcriber(s) or telephony-service(s)
        kind: ServiceKind,
        #[command(subcommand)]
        action: ServiceCommand,
    },
    /// Place a test call to a phone number
    TestCall(TestCallArgs),
}

#[derive(Debug, Subcommand)]
pub enum CampaignCommand {
    List,
    Show { id: String },
    Create(CampaignArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: CampaignArgs,
    },
    Delete { id: String },
    /// Ask the engine to start a campaign that is not running
    Start { id: String },
    /// Ask the engine to stop a running campaign
    Stop { id: String },
}

/// Campaign form fields. Unset flags keep the current value.
#[derive(Debug, Default, Args)]
pub struct CampaignArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// OUTBOUND or INBOUND
    #[arg(long = "type")]
    pub campaign_type: Option<String>,
    #[arg(long)]
    pub prompt: Option<String>,
    #[arg(long)]
    pub initial_message: Option<String>,
    #[arg(long)]
    pub telephony_service_id: Option<String>,
    /// JSON override; an empty string removes it
    #[arg(long)]
    pub telephony_config: Option<String>,
    #[arg(long)]
    pub transcriber_id: Option<String>,
    #[arg(long)]
    pub transcriber_config: Option<String>,
    #[arg(long)]
    pub agent_id: Option<String>,
    #[arg(long)]
    pub agent_config: Option<String>,
    #[arg(long)]
    pub synthesizer_id: Option<String>,
    #[arg(long)]
    pub synthesizer_config: Option<String>,
    /// Customer set to target; repeat for several. Replaces the membership.
    #[arg(long = "customer-set")]
    pub customer_sets: Vec<String>,
    /// Remove every customer set from the campaign
    #[arg(long, conflicts_with = "customer_sets")]
    pub clear_customer_sets: bool,
}

impl CampaignArgs {
    /// Overlay the flags that were given onto `form`.
    pub fn apply(&self, form: &mut CampaignForm) {
        let set = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                target.clone_from(value);
            }
        };
        set(&mut form.name, &self.name);
        set(&mut form.campaign_type, &self.campaign_type);
        set(&mut form.prompt, &self.prompt);
        set(&mut form.initial_message, &self.initial_message);
        if let Some(description) = &self.description {
            form.description = Some(description.clone()).filter(|d| !d.is_empty());
        }

        for (slot, id, config) in [
            (ChannelSlot::Telephony, &self.telephony_service_id, &self.telephony_config),
            (ChannelSlot::Transcriber, &self.transcriber_id, &self.transcriber_config),
            (ChannelSlot::Agent, &self.agent_id, &self.agent_config),
            (ChannelSlot::Synthesizer, &self.synthesizer_id, &self.synthesizer_config),
        ] {
            if let Some(id) = id {
                form.channel_mut(slot).service_id = Some(id.clone()).filter(|i| !i.is_empty());
            }
            if let Some(text) = config {
                form.set_config_text(slot, Some(text));
            }
        }

        if self.clear_customer_sets {
            form.customer_sets.clear();
        } else if !self.customer_sets.is_empty() {
            form.customer_sets.clone_from(&self.customer_sets);
        }
    }

    fn changes_membership(&self) -> bool {
        self.clear_customer_sets || !self.customer_sets.is_empty()
    }
}

#[derive(Debug, Subcommand)]
pub enum CustomerSetCommand {
    List,
    Show { id: String },
    /// Create a customer set from one CSV file
    Upload {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    /// List the customers of one customer set
    List {
        #[arg(long = "set")]
        customer_set_id: String,
    },
    Show { id: String },
    Create {
        #[arg(long = "set")]
        customer_set_id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        mobile: String,
        /// Extra columns as a JSON object
        #[arg(long, default_value = "{}")]
        metadata: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        metadata: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CallCommand {
    List,
    Show { id: String },
    Transcript { id: String },
    Actions { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    List,
    Show { id: String },
    Create {
        #[arg(long)]
        name: String,
        /// Configuration as a JSON object
        #[arg(long)]
        config: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        config: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct TestCallArgs {
    #[arg(long)]
    pub mobile: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub company: String,
    #[arg(long)]
    pub product: String,
    /// Leave unset to use the backend's default prompt
    #[arg(long, default_value = "")]
    pub prompt: String,
    #[arg(long, default_value = "")]
    pub initial_message: String,
    #[arg(long, default_value = "low")]
    pub interrupt_sensitivity: InterruptSensitivity,
    #[arg(long, default_value = "google")]
    pub synthesizer: SynthesizerKind,
    #[arg(long, default_value = DEFAULT_VOICE)]
    pub voice: String,
}

impl From<TestCallArgs> for TestCallForm {
    fn from(args: TestCallArgs) -> Self {
        TestCallForm {
            mobile_number: args.mobile,
            name: args.name,
            company: args.company,
            company_product: args.product,
            prompt: args.prompt,
            initial_message: args.initial_message,
            interrupt_sensitivity: args.interrupt_sensitivity,
            synthesizer: args.synthesizer,
            voice: args.voice,
        }
    }
}

impl Cli {
    /// Environment configuration with command-line flags taking precedence.
    pub fn config(&self) -> Result<ClientConfig, ConfigError> {
        ClientConfig::from_lookup(|name| {
            let flag = match name {
                "OLIVE_BACKEND_URL" => self.backend_url.clone(),
                "OLIVE_ACCESS_TOKEN" => self.token.clone(),
                "OLIVE_ORGANIZATION_ID" => self.organization_id.clone(),
                _ => None,
            };
            flag.or_else(|| std::env::var(name).ok())
        })
    }
}

/// Execute one command against the configured backend.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config()?;
    tracing::debug!(backend_url = %config.backend_url, signed_in = config.access_token.is_some(), "Loaded client configuration");

    let session: Arc<dyn SessionProvider> = Arc::new(SessionStore::new(config.session()));
    let dashboard = Dashboard::connect(config.backend_url.clone(), session);

    match cli.command {
        Command::Campaigns { action } => campaigns(&dashboard, action).await,
        Command::CustomerSets { action } => customer_sets(&dashboard, action).await,
        Command::Customers { action } => customers(&dashboard, action).await,
        Command::Calls { action } => calls(&dashboard, action).await,
        Command::Services { kind, action } => services(&dashboard, kind, action).await,
        Command::TestCall(args) => {
            let reply = dashboard.test_call(&TestCallForm::from(args)).await?;
            print_json(&reply)
        }
    }
}

async fn campaigns(dashboard: &Dashboard, action: CampaignCommand) -> anyhow::Result<()> {
    match action {
        CampaignCommand::List => print_json(&dashboard.campaigns().await?),
        CampaignCommand::Show { id } => print_json(&dashboard.campaign(&id).await?),
        CampaignCommand::Create(fields) => {
            let mut form = CampaignForm {
                campaign_type: "OUTBOUND".to_string(),
                ..Default::default()
            };
            fields.apply(&mut form);
            let mut campaign = dashboard.create_campaign(&form).await?;

            // New campaigns start without targets; attach them as an edit.
            if fields.changes_membership() {
                let mut edit = CampaignForm::from_campaign(&campaign);
                fields.apply(&mut edit);
                campaign = dashboard.update_campaign(&campaign.id, &edit).await?;
            }
            print_json(&campaign)
        }
        CampaignCommand::Update { id, fields } => {
            let current = dashboard.campaign(&id).await?;
            let mut form = CampaignForm::from_campaign(&current);
            fields.apply(&mut form);
            print_json(&dashboard.update_campaign(&id, &form).await?)
        }
        CampaignCommand::Delete { id } => {
            dashboard.delete_campaign(&id).await?;
            println!("Deleted campaign {id}");
            Ok(())
        }
        CampaignCommand::Start { id } => execute(dashboard, &id, CampaignAction::Start).await,
        CampaignCommand::Stop { id } => execute(dashboard, &id, CampaignAction::Stop).await,
    }
}

async fn execute(dashboard: &Dashboard, id: &str, action: CampaignAction) -> anyhow::Result<()> {
    let campaign = dashboard.campaign(id).await?;
    let response = dashboard.execute_campaign(&campaign, action).await?;
    print_json(&response)
}

async fn customer_sets(dashboard: &Dashboard, action: CustomerSetCommand) -> anyhow::Result<()> {
    match action {
        CustomerSetCommand::List => print_json(&dashboard.customer_sets().await?),
        CustomerSetCommand::Show { id } => print_json(&dashboard.customer_set(&id).await?),
        CustomerSetCommand::Upload {
            name,
            description,
            files,
        } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(read_upload(path).await?);
            }
            let form = CustomerSetForm {
                name,
                description,
                set_type: CustomerSetType::File,
            };
            print_json(&dashboard.create_customer_set(form, uploads).await?)
        }
        CustomerSetCommand::Update {
            id,
            name,
            description,
        } => {
            let current = dashboard.customer_set(&id).await?;
            let form = CustomerSetForm {
                name: name.or(current.name).unwrap_or_default(),
                description: description.or(current.description),
                set_type: current.set_type,
            };
            print_json(&dashboard.update_customer_set(&id, &form).await?)
        }
        CustomerSetCommand::Delete { id } => {
            dashboard.delete_customer_set(&id).await?;
            println!("Deleted customer set {id}");
            Ok(())
        }
    }
}

/// Read a file for upload, guessing its content type from the extension.
pub async fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string());
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(UploadFile {
        file_name,
        content_type,
        bytes,
    })
}

async fn customers(dashboard: &Dashboard, action: CustomerCommand) -> anyhow::Result<()> {
    match action {
        CustomerCommand::List { customer_set_id } => {
            print_json(&dashboard.customers(&customer_set_id).await?)
        }
        CustomerCommand::Show { id } => print_json(&dashboard.customer(&id).await?),
        CustomerCommand::Create {
            customer_set_id,
            name,
            mobile,
            metadata,
        } => {
            let body = CreateCustomer {
                organization_id: dashboard.organization_id().await?,
                customer_set_id,
                name,
                mobile_number: mobile,
                customer_metadata: parse_json("--metadata", &metadata)?,
            };
            print_json(&dashboard.create_customer(&body).await?)
        }
        CustomerCommand::Update {
            id,
            name,
            mobile,
            metadata,
        } => {
            let body = UpdateCustomer {
                name,
                mobile_number: mobile,
                customer_metadata: metadata
                    .as_deref()
                    .map(|text| parse_json("--metadata", text))
                    .transpose()?,
            };
            print_json(&dashboard.update_customer(&id, &body).await?)
        }
    }
}

async fn calls(dashboard: &Dashboard, action: CallCommand) -> anyhow::Result<()> {
    match action {
        CallCommand::List => print_json(&dashboard.calls().await?),
        CallCommand::Show { id } => print_json(&dashboard.call(&id).await?),
        CallCommand::Transcript { id } => {
            let transcript = dashboard.call_transcript(&id).await?;
            println!("{}", render_transcript(transcript.as_ref()));
            Ok(())
        }
        CallCommand::Actions { id } => print_json(&dashboard.call_actions(&id).await?),
    }
}

async fn services(
    dashboard: &Dashboard,
    kind: ServiceKind,
    action: ServiceCommand,
) -> anyhow::Result<()> {
    match action {
        ServiceCommand::List => print_json(&dashboard.services(kind).await?),
        ServiceCommand::Show { id } => print_json(&dashboard.service(kind, &id).await?),
        ServiceCommand::Create { name, config } => {
            let body = CreateService::from_text(&name, config.as_deref())?;
            print_json(&dashboard.create_service(kind, &body).await?)
        }
        ServiceCommand::Update { id, name, config } => {
            let body = UpdateService::from_text(name.as_deref(), config.as_deref())?;
            print_json(&dashboard.update_service(kind, &id, &body).await?)
        }
    }
}

fn parse_json(flag: &str, text: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(text).with_context(|| format!("{flag} is not valid JSON"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn update_flags_overlay_the_stored_form() {
        let cli = Cli::try_parse_from([
            "olive",
            "campaigns",
            "update",
            "cmp-1",
            "--agent-config",
            "{\"temperature\": 0.4}",
            "--synthesizer-config",
            "",
            "--customer-set",
            "cs-2",
            "--customer-set",
            "cs-3",
        ])
        .unwrap();
        let Command::Campaigns {
            action: CampaignCommand::Update { id, fields },
        } = cli.command
        else {
            panic!("expected campaigns update");
        };
        assert_eq!(id, "cmp-1");

        let mut form = CampaignForm {
            name: "Renewals".into(),
            campaign_type: "INBOUND".into(),
            prompt: "Answer questions".into(),
            customer_sets: vec!["cs-1".into()],
            ..Default::default()
        };
        form.set_config_text(ChannelSlot::Synthesizer, Some("{\"voice\": \"maya\"}"));
        fields.apply(&mut form);

        assert_eq!(form.name, "Renewals");
        assert_eq!(form.customer_sets, vec!["cs-2", "cs-3"]);
        assert_eq!(form.config_text(ChannelSlot::Synthesizer), None);
        assert!(form.config_text(ChannelSlot::Agent).is_some());
    }

    #[test]
    fn clear_and_set_membership_conflict() {
        let parsed = Cli::try_parse_from([
            "olive",
            "campaigns",
            "update",
            "cmp-1",
            "--clear-customer-sets",
            "--customer-set",
            "cs-1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn service_kind_accepts_collection_names() {
        let cli = Cli::try_parse_from(["olive", "services", "telephony-services", "list"]).unwrap();
        assert_matches!(
            cli.command,
            Command::Services {
                kind: ServiceKind::TelephonyService,
                action: ServiceCommand::List
            }
        );
    }

    #[test]
    fn test_call_defaults() {
        let cli = Cli::try_parse_from([
            "olive",
            "test-call",
            "--mobile",
            "9876543210",
            "--name",
            "Asha",
            "--company",
            "Acme",
            "--product",
            "Solar panels",
        ])
        .unwrap();
        let Command::TestCall(args) = cli.command else {
            panic!("expected test-call");
        };
        let form = TestCallForm::from(args);
        assert_eq!(form.voice, DEFAULT_VOICE);
        assert_eq!(form.interrupt_sensitivity, InterruptSensitivity::Low);
        assert_eq!(form.synthesizer, SynthesizerKind::Google);
    }

    #[tokio::test]
    async fn csv_uploads_are_typed_from_the_extension() {
        let path = std::env::temp_dir().join("olive-cli-upload-test.csv");
        tokio::fs::write(&path, "name,mobile_number\nAsha,9876543210\n")
            .await
            .unwrap();
        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.content_type, "text/csv");
        assert_eq!(upload.file_name, "olive-cli-upload-test.csv");
        let _ = tokio::fs::remove_file(&path).await;
    }
}
