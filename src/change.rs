//! Change classification.
//!
//! A change's `value` arrives as untyped JSON. Its `field` names the schema it
//! must be decoded into; the table below maps each known `field` to a
//! decoder. Fields missing from the table are not errors: the platform adds
//! new categories over time and older integrations must keep working, so
//! [`classify`] returns `Ok(None)` for them.

use serde_json::Value;

use crate::{
    error::ChangeError,
    payload::{
        AccountAlertsValue, AccountReviewValue, AccountUpdateValue,
        BusinessCapabilityUpdateValue, Change, HistoryValue, MessagesValue,
        PaymentConfigurationUpdateValue, PhoneNumberNameUpdateValue,
        PhoneNumberQualityUpdateValue, SecurityValue, SmbAppStateSyncValue,
        SmbMessageEchoesValue, TemplateCategoryUpdateValue, TemplateComponentsUpdateValue,
        TemplateQualityUpdateValue, TemplateStatusUpdateValue, UserPreferencesValue,
    },
};

type Decoder = fn(Value) -> Result<ChangeValue, serde_json::Error>;

change_table! {
    /// Inbound messages and delivery statuses.
    "messages" => Messages(MessagesValue),
    "account_alerts" => AccountAlerts(AccountAlertsValue),
    "account_update" => AccountUpdate(AccountUpdateValue),
    "account_review" => AccountReview(AccountReviewValue),
    "template_category_update" | "template_category" => TemplateCategoryUpdate(TemplateCategoryUpdateValue),
    "message_template_quality" => TemplateQuality(TemplateQualityUpdateValue),
    "message_template_status" => TemplateStatus(TemplateStatusUpdateValue),
    "message_template_components_update" => TemplateComponentsUpdate(TemplateComponentsUpdateValue),
    "phone_number_name" => PhoneNumberName(PhoneNumberNameUpdateValue),
    "phone_number_quality" => PhoneNumberQuality(PhoneNumberQualityUpdateValue),
    "business_capability" => BusinessCapability(BusinessCapabilityUpdateValue),
    "security" => Security(SecurityValue),
    "user_preferences" => UserPreferences(UserPreferencesValue),
    "payment_configuration_update" => PaymentConfigurationUpdate(PaymentConfigurationUpdateValue),
    "smb_app_state_sync" => SmbAppStateSync(SmbAppStateSyncValue),
    "smb_message_echoes" => SmbMessageEchoes(SmbMessageEchoesValue),
    "history" => History(HistoryValue),
}

/// Looks up the decoder registered for `field`.
fn decoder(field: &str) -> Option<Decoder> {
    DECODERS
        .iter()
        .find(|(tag, _)| *tag == field)
        .map(|(_, decode)| *decode)
}

/// Whether `field` is in the table.
pub fn is_known(field: &str) -> bool {
    decoder(field).is_some()
}

/// Every `field` the table recognizes, aliases included.
pub fn known_fields() -> impl Iterator<Item = &'static str> {
    DECODERS.iter().map(|(tag, _)| *tag)
}

/// Decodes one change into its typed value.
///
/// - `Ok(Some(_))`: the field is known and the value matched its schema.
/// - `Ok(None)`: the field is unknown; skip it.
/// - `Err(_)`: the field is known but the value did not match.
///
/// `account_id` only goes into the error for context.
pub fn classify(change: Change, account_id: &str) -> Result<Option<ChangeValue>, ChangeError> {
    let Some(decode) = decoder(&change.field) else {
        return Ok(None);
    };

    decode(change.value).map(Some).map_err(|source| ChangeError {
        field: change.field,
        account_id: account_id.to_owned(),
        source,
    })
}
