use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;

use intake_core::{
    ConditionType, ConsultationStatus, ConsultationWizard, DashboardStats, IntakeConfig,
    IntakeForm, RecordPatch, SessionRole,
};
use intake_notify::DispatchOutcome;
use intake_store::NewImage;

#[derive(Parser, Debug)]
#[command(
    name = "intake-cli",
    about = "Chạy thử luồng tiếp nhận tư vấn trên máy cục bộ."
)]
struct Args {
    /// Đường dẫn file SQLite.
    #[arg(long, default_value = "intake.db")]
    db: PathBuf,
    /// Thư mục lưu ảnh tải lên.
    #[arg(long, default_value = "media")]
    media_root: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Nộp phiếu tư vấn từ file JSON.
    Submit {
        /// Đường dẫn tới file JSON chứa lựa chọn và phiếu.
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Liệt kê hồ sơ tư vấn.
    List,
    /// Số liệu tổng hợp cho bảng điều khiển.
    Stats,
    /// Đặt trạng thái cho một hồ sơ.
    SetStatus { id: String, status: String },
    /// Đánh dấu hồ sơ đã thanh toán.
    MarkPaid { id: String },
    /// Xóa một hồ sơ.
    Delete { id: String },
    /// Tải một ảnh minh họa bệnh học.
    UploadImage {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "image/png")]
        mime: String,
    },
    /// Liệt kê ảnh theo thứ tự hiển thị.
    ListImages,
    /// Xóa một ảnh cùng file đã lưu.
    DeleteImage { id: String },
    /// Đăng nhập thử với danh sách tài khoản đã cấu hình.
    Login {
        role: String,
        identity: String,
        password: String,
    },
}

/// Dữ liệu đầu vào của lệnh `submit`.
#[derive(Deserialize, Debug)]
struct SubmitInput {
    condition_type: String,
    system: String,
    disease: String,
    form: IntakeForm,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = IntakeConfig::default();
    let mut conn = intake_store::open(&args.db)
        .with_context(|| format!("Không mở được database {:?}", args.db))?;
    let media = intake_store::MediaStore::new(&args.media_root, "https://media.clinic.example");
    let feed = intake_store::ChangeFeed::new();

    match args.command {
        Command::Submit { input } => {
            let data = std::fs::read_to_string(&input)
                .with_context(|| format!("Không đọc được file {input:?}"))?;
            let submit: SubmitInput =
                serde_json::from_str(&data).context("File đầu vào không hợp lệ")?;

            let mut wizard = ConsultationWizard::new();
            wizard.select_condition_type(ConditionType::from_str(&submit.condition_type)?)?;
            wizard.select_system(&submit.system)?;
            wizard.select_disease(&submit.disease)?;
            wizard.accept_fee()?;
            let draft = wizard.submit(submit.form)?;

            let record = intake_store::add_consultation(&mut conn, draft)?;
            println!(
                "Đã lưu hồ sơ {} (số {}) - phí {}",
                record.id,
                record.number.unwrap_or_default(),
                record.fee
            );

            match intake_notify::dispatch_or_mailto(None, &record, "clinic@clinic.example") {
                DispatchOutcome::Sent => {
                    intake_store::update_consultation(
                        &conn,
                        &record.id,
                        &RecordPatch::SetNotificationSent(true),
                    )?;
                    println!("Đã gửi thông báo qua dịch vụ email.");
                }
                DispatchOutcome::MailtoFallback(uri) => {
                    println!("Chưa cấu hình dịch vụ email, mở thủ công:\n{uri}");
                }
            }
        }
        Command::List => {
            for record in intake_store::list_consultations(&conn)? {
                println!(
                    "{} | #{:<4} | {:<20} | {:<28} | {:<16} | paid={} | {}",
                    record.id,
                    record.number.unwrap_or_default(),
                    record.patient_name,
                    record.condition_name,
                    record.status.as_str(),
                    record.paid,
                    record.submitted_at.to_rfc3339()
                );
            }
        }
        Command::Stats => {
            let records = intake_store::list_consultations(&conn)?;
            let stats = DashboardStats::collect(&records);
            println!(
                "Tổng: {}\nChờ xử lý: {}\nĐang tư vấn: {}\nChờ thanh toán: {}\nHoàn tất: {}\nĐã thanh toán: {}",
                stats.total,
                stats.pending,
                stats.in_progress,
                stats.awaiting_payment,
                stats.completed,
                stats.paid
            );
        }
        Command::SetStatus { id, status } => {
            let status = ConsultationStatus::from_str(&status)?;
            intake_store::update_consultation(&conn, &id, &RecordPatch::SetStatus(status))?;
            println!("Đã đặt trạng thái {} cho {id}", status.as_str());
        }
        Command::MarkPaid { id } => {
            intake_store::update_consultation(&conn, &id, &RecordPatch::SetPaid(true))?;
            println!("Đã đánh dấu thanh toán cho {id}");
        }
        Command::Delete { id } => {
            intake_store::delete_consultation(&conn, &id)?;
            println!("Đã xóa {id}");
        }
        Command::UploadImage {
            file,
            title,
            description,
            mime,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Không đọc được file {file:?}"))?;
            let original_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("upload.bin");

            let image = intake_store::upload_image(
                &mut conn,
                &media,
                &feed,
                &config.upload,
                NewImage {
                    bytes: &bytes,
                    original_name,
                    mime: &mime,
                    title,
                    description,
                },
            )?;
            println!(
                "Đã tải ảnh {} (thứ tự {}) -> {}",
                image.id, image.display_order, image.image_url
            );
        }
        Command::ListImages => {
            for image in intake_store::list_images(&conn)? {
                println!(
                    "{} | {:<3} | {:<24} | {}",
                    image.id, image.display_order, image.title, image.image_url
                );
            }
        }
        Command::DeleteImage { id } => {
            let images = intake_store::list_images(&conn)?;
            let image = images
                .iter()
                .find(|image| image.id == id)
                .context("Không tìm thấy ảnh với id này")?;
            intake_store::delete_image(&conn, &media, &feed, &image.id, &image.image_url)?;
            println!("Đã xóa ảnh {id}");
        }
        Command::Login {
            role,
            identity,
            password,
        } => {
            let role = SessionRole::from_str(&role)?;
            let credentials = intake_store::default_credentials();
            match intake_store::login(&conn, &credentials, &identity, &password, role)? {
                Some(session) => {
                    println!("Đăng nhập thành công, token: {}", session.token);
                    let fresh =
                        intake_store::verify(&conn, &session.token, config.session_ttl_hours)?;
                    println!("Phiên còn hạn: {}", fresh.is_some());
                }
                None => println!("Sai thông tin đăng nhập."),
            }
        }
    }

    Ok(())
}
