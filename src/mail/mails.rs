use super::sendmail::send_email;

pub async fn send_payout_success_email(
    to_email: &str,
    name: &str,
    total_amount: &str,
    tds_amount: &str,
    net_amount: &str,
    utr_number: &str,
    transaction_date: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subject = "Your commission payout has been credited";
    let template_path = "src/mail/templates/Payout-success.html";
    let placeholders = vec![
        ("{{name}}".to_string(), name.to_string()),
        ("{{total_amount}}".to_string(), total_amount.to_string()),
        ("{{tds_amount}}".to_string(), tds_amount.to_string()),
        ("{{net_amount}}".to_string(), net_amount.to_string()),
        ("{{utr_number}}".to_string(), utr_number.to_string()),
        ("{{transaction_date}}".to_string(), transaction_date.to_string()),
    ];

    send_email(to_email, subject, template_path, &placeholders).await
}

pub async fn send_payout_failure_email(
    to_email: &str,
    name: &str,
    net_amount: &str,
    reason: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subject = "Your commission payout could not be completed";
    let template_path = "src/mail/templates/Payout-failed.html";
    let placeholders = vec![
        ("{{name}}".to_string(), name.to_string()),
        ("{{net_amount}}".to_string(), net_amount.to_string()),
        ("{{reason}}".to_string(), reason.to_string()),
    ];

    send_email(to_email, subject, template_path, &placeholders).await
}
