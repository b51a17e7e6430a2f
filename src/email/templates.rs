fn expiry_text(ttl_minutes: i64) -> String {
    match ttl_minutes {
        m if m % (24 * 60) == 0 => format!("{} day(s)", m / (24 * 60)),
        m if m % 60 == 0 => format!("{} hour(s)", m / 60),
        m => format!("{m} minute(s)"),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn greeting(name: &str) -> String {
    if name.trim().is_empty() {
        "Hi,".to_string()
    } else {
        format!("Hi {},", escape(name.trim()))
    }
}

pub fn render_verification(name: &str, verify_url: &str, ttl_minutes: i64) -> String {
    let greeting = greeting(name);
    let expires = expiry_text(ttl_minutes);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Confirm your email</h2>
    <p>{greeting}</p>
    <p>Thanks for joining GymPro. Please confirm your email address to activate your account.</p>
    <p><a href="{verify_url}" style="display: inline-block; padding: 10px 20px; background: #16a34a; color: white; text-decoration: none; border-radius: 4px;">Verify Email</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in {expires}. If you didn't sign up, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_password_reset(name: &str, reset_url: &str, ttl_minutes: i64) -> String {
    let greeting = greeting(name);
    let expires = expiry_text(ttl_minutes);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset</h2>
    <p>{greeting}</p>
    <p>A password reset was requested for your GymPro account.</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #16a34a; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in {expires}. If you didn't request this, you can ignore it.</p>
</body>
</html>"#
    )
}
