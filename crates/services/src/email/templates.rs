fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #1f2937; max-width: 560px; margin: 0 auto;">
    <h1 style="font-size: 22px;">{title}</h1>
    {body}
    <p style="color: #6b7280; font-size: 12px;">OKRHub</p>
  </body>
</html>"#
    )
}

pub fn welcome(name: &str, organization_name: &str, public_url: &str) -> String {
    let body = format!(
        r#"<p>Hi {name},</p>
    <p><strong>{org}</strong> is set up on OKRHub. Create your first team and start tracking objectives.</p>
    <p><a href="{url}">Open OKRHub</a></p>"#,
        name = escape(name),
        org = escape(organization_name),
        url = escape(public_url),
    );
    layout(&format!("Welcome to {}", escape(organization_name)), &body)
}

pub fn invitation(invitee_name: &str, team_name: &str, inviter_name: &str, link: &str) -> String {
    let body = format!(
        r#"<p>Hi {invitee},</p>
    <p>{inviter} invited you to join <strong>{team}</strong>.</p>
    <p><a href="{link}">Accept invitation</a></p>"#,
        invitee = escape(invitee_name),
        inviter = escape(inviter_name),
        team = escape(team_name),
        link = escape(link),
    );
    layout("You're invited", &body)
}
