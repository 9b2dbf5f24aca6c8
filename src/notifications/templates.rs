use crate::entities::{alert_definition, alert_instance};

pub struct NotificationTemplates;

impl NotificationTemplates {
    pub fn alert_title(name: &str, severity: &str, kind: &str) -> String {
        match kind {
            "resolved" => format!("✅ RESOLVED: {}", name),
            "repeat" => format!("🔁 STILL ACTIVE [{}]: {}", severity.to_uppercase(), name),
            _ => format!("🚨 ALERT [{}]: {}", severity.to_uppercase(), name),
        }
    }

    /// Short line for the dashboard feed.
    pub fn alert_dashboard(
        def: &alert_definition::Model,
        instance: &alert_instance::Model,
        kind: &str,
    ) -> String {
        let value = instance
            .last_value
            .as_deref()
            .or(instance.trigger_value.as_deref())
            .unwrap_or("n/a");
        match kind {
            "resolved" => format!(
                "{} resolved on {} (last value {})",
                def.name, instance.target_key, value
            ),
            "repeat" => format!(
                "{} still active on {} (current value {})",
                def.name, instance.target_key, value
            ),
            _ => format!(
                "{} fired on {} (trigger value {})",
                def.name, instance.target_key, value
            ),
        }
    }

    /// Rich HTML email body.
    pub fn alert_email(
        def: &alert_definition::Model,
        instance: &alert_instance::Model,
        kind: &str,
    ) -> String {
        let trigger = instance.trigger_value.as_deref().unwrap_or("n/a");
        let last = instance.last_value.as_deref().unwrap_or(trigger);
        let (badge_color, headline) = match kind {
            "resolved" => ("#00b894", "Alert Resolved"),
            "repeat" => ("#fdcb6e", "Alert Still Active"),
            _ => ("#d63031", "Alert Fired"),
        };

        format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 8px; }}
        .header {{ background-color: #dfe6e9; padding: 15px; border-radius: 8px 8px 0 0; text-align: center; }}
        .header h1 {{ margin: 0; color: #2d3436; }}
        .badge {{ background-color: {badge_color}; color: white; padding: 5px 10px; border-radius: 4px; font-weight: bold; display: inline-block; margin-top: 10px; }}
        .content {{ padding: 20px; }}
        .row {{ margin-bottom: 8px; }}
        .label {{ color: #636e72; font-weight: bold; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #b2bec3; text-align: center; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{headline}</h1>
            <div class="badge">SEVERITY: {severity}</div>
        </div>
        <div class="content">
            <div class="row"><span class="label">Rule:</span> {name}</div>
            <div class="row"><span class="label">Target:</span> {target}</div>
            <div class="row"><span class="label">Trigger value:</span> {trigger}</div>
            <div class="row"><span class="label">Current value:</span> {last}</div>
            <div class="row"><span class="label">Fired at:</span> {fired_at} UTC</div>
        </div>
        <div class="footer">
            <p>Sent by ZonePulse facilities monitoring</p>
        </div>
    </div>
</body>
</html>
"#,
            badge_color = badge_color,
            headline = headline,
            severity = def.severity.to_uppercase(),
            name = def.name,
            target = instance.target_key,
            trigger = trigger,
            last = last,
            fired_at = instance.fired_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }

    /// Concise SMS body.
    pub fn alert_sms(
        def: &alert_definition::Model,
        instance: &alert_instance::Model,
        kind: &str,
    ) -> String {
        let value = instance
            .last_value
            .as_deref()
            .or(instance.trigger_value.as_deref())
            .unwrap_or("n/a");
        let state = match kind {
            "resolved" => "RESOLVED",
            "repeat" => "STILL ACTIVE",
            _ => "FIRED",
        };
        format!(
            "ZonePulse {}: {} on {}\nSeverity: {}\nValue: {}",
            state,
            def.name,
            instance.target_key,
            def.severity.to_uppercase(),
            value
        )
    }
}
