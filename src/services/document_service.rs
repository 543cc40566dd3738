// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{common::error::AppError, models::authorization::Authorization};

const CURSOS: [&str; 5] = [
    "INFORMÁTICA BÁSICA",
    "INFORMÁTICA AVANÇADA",
    "ADMINISTRAÇÃO",
    "INGLÊS",
    "ESPANHOL",
];

/// Gera a ficha de atendimento impressa entregue na visita.
#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
    font_family: String,
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

impl DocumentService {
    pub fn new(fonts_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            font_family: font_family.into(),
        }
    }

    /// Renderiza em uma thread de bloqueio; a montagem do PDF é só CPU.
    pub async fn ficha_pdf(&self, record: Authorization) -> Result<Vec<u8>, AppError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.render_ficha(&record))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de geração do PDF: {}", e))?
    }

    pub(crate) fn render_ficha(&self, record: &Authorization) -> Result<Vec<u8>, AppError> {
        // 1. Carrega a fonte configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None).map_err(|e| {
            tracing::error!(dir = %self.fonts_dir.display(), familia = %self.font_family, error = %e, "Fonte da ficha não encontrada");
            AppError::FontNotFound(format!("{} em {}", self.font_family, self.fonts_dir.display()))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Ficha de atendimento - {}", record.nome_aluno));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        let title = style::Style::new().bold().with_font_size(16);
        let section = style::Style::new().bold().with_font_size(12);

        doc.push(elements::Paragraph::new("FICHA DE ATENDIMENTO").styled(title));
        doc.push(elements::Paragraph::new(format!(
            "Cadastro em {}",
            record.data_cadastro.format("%d/%m/%Y")
        )));
        doc.push(elements::Break::new(1.5));

        // --- ALUNO ---
        doc.push(elements::Paragraph::new("DADOS PESSOAIS DO JOVEM").styled(section));
        doc.push(field_table(&[
            ("Nome", record.nome_aluno.clone()),
            ("Idade", record.idade.to_string()),
            ("Série", record.serie.clone()),
            ("Turno", record.turno.clone()),
            ("Escola", record.escola.clone()),
        ])?);
        doc.push(elements::Break::new(1));

        // --- RESPONSÁVEL ---
        doc.push(elements::Paragraph::new("DADOS PESSOAIS DO RESPONSÁVEL").styled(section));
        doc.push(field_table(&[
            ("Nome", record.nome_responsavel.clone()),
            ("Telefone", record.telefone.clone()),
        ])?);
        doc.push(elements::Break::new(1));

        // --- AGENDAMENTO (quando houver) ---
        if let (Some(data), Some(hora)) = (record.data_agendamento, record.hora_agendamento.as_ref()) {
            doc.push(elements::Paragraph::new("AGENDAMENTO").styled(section));
            let mut rows = vec![
                ("Data", data.format("%d/%m/%Y").to_string()),
                ("Hora", hora.clone()),
            ];
            if let Some(atendente) = &record.atendente_id {
                rows.push(("Atendente", atendente.clone()));
            }
            if let Some(obs) = &record.observacoes {
                rows.push(("Observações", obs.clone()));
            }
            doc.push(field_table(&rows)?);
            doc.push(elements::Break::new(1));
        }

        // --- PERFIL PROFISSIONAL ---
        doc.push(elements::Paragraph::new("PERFIL PROFISSIONAL DO ALUNO").styled(section));
        for curso in CURSOS {
            doc.push(elements::Paragraph::new(format!("(   )  {curso}")));
        }
        doc.push(elements::Break::new(1));

        doc.push(elements::Paragraph::new("PERFIL SOCIAL").styled(section));
        doc.push(elements::Paragraph::new("Renda familiar: ______________________________"));
        doc.push(elements::Paragraph::new("Pessoas na residência: _______________________"));
        doc.push(elements::Break::new(2));

        // --- QR CODE com o id do cadastro ---
        let code = QrCode::new(record.id.to_string().as_bytes()).map_err(pdf_error)?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
        let qr = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.4, 0.4));
        doc.push(qr);
        doc.push(elements::Break::new(2));

        // --- ASSINATURA ---
        doc.push(elements::Paragraph::new("________________________________________"));
        doc.push(elements::Paragraph::new("Assinatura do Responsável").styled(style::Style::new().italic()));

        // 2. Renderiza para Buffer (Memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;

        tracing::debug!(id = %record.id, bytes = buffer.len(), "Ficha gerada");
        Ok(buffer)
    }
}

fn field_table(rows: &[(&str, String)]) -> Result<elements::TableLayout, AppError> {
    let mut table = elements::TableLayout::new(vec![1, 3]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let label = style::Style::new().bold();
    for (name, value) in rows {
        table
            .row()
            .element(elements::Paragraph::new(*name).styled(label))
            .element(elements::Paragraph::new(value.as_str()))
            .push()
            .map_err(pdf_error)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use uuid::Uuid;

    use super::*;
    use crate::models::authorization::{fixtures::authorization, AuthorizationStatus};

    #[test]
    fn missing_font_is_reported() {
        let service = DocumentService::new("./nao-existe", "Roboto");
        let err = service
            .render_ficha(&authorization(AuthorizationStatus::Agendado))
            .unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(msg) if msg.contains("Roboto")));
    }

    // Famílias comuns em distribuições Linux, no formato (pasta, regular, negrito, itálico, negrito-itálico).
    const SYSTEM_FONTS: [(&str, [&str; 4]); 2] = [
        (
            "/usr/share/fonts/truetype/liberation",
            [
                "LiberationSans-Regular.ttf",
                "LiberationSans-Bold.ttf",
                "LiberationSans-Italic.ttf",
                "LiberationSans-BoldItalic.ttf",
            ],
        ),
        (
            "/usr/share/fonts/truetype/dejavu",
            [
                "DejaVuSans.ttf",
                "DejaVuSans-Bold.ttf",
                "DejaVuSans-Oblique.ttf",
                "DejaVuSans-BoldOblique.ttf",
            ],
        ),
    ];

    /// Copia a primeira família instalada para uma pasta temporária com os
    /// nomes que o genpdf espera (`Ficha-Regular.ttf`, ...).
    fn installed_font_dir() -> Option<PathBuf> {
        let (dir, files) = SYSTEM_FONTS
            .iter()
            .find(|(dir, files)| files.iter().all(|f| Path::new(dir).join(f).is_file()))?;

        let target = std::env::temp_dir().join(format!("ficha-fonts-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&target).unwrap();
        for (file, style) in files.iter().zip(["Regular", "Bold", "Italic", "BoldItalic"]) {
            std::fs::copy(Path::new(dir).join(file), target.join(format!("Ficha-{style}.ttf"))).unwrap();
        }
        Some(target)
    }

    fn scheduled_record() -> Authorization {
        let mut record = authorization(AuthorizationStatus::Agendado);
        record.coordenadora_id = Some("C1".into());
        record.atendente_id = Some("T1".into());
        record.data_agendamento = chrono::NaiveDate::from_ymd_opt(2025, 3, 10);
        record.hora_agendamento = Some("14:00".into());
        record.observacoes = Some("Levar documento do responsável".into());
        record
    }

    #[tokio::test]
    async fn ficha_renders_a_pdf() {
        let Some(fonts_dir) = installed_font_dir() else {
            eprintln!("nenhuma fonte TrueType do sistema encontrada, pulando");
            return;
        };
        let service = DocumentService::new(&fonts_dir, "Ficha");

        let scheduled = service.ficha_pdf(scheduled_record()).await.unwrap();
        assert!(scheduled.starts_with(b"%PDF"));

        // Sem agendamento a seção some, mas o documento continua válido
        let pending = service
            .ficha_pdf(authorization(AuthorizationStatus::Pendente))
            .await
            .unwrap();
        assert!(pending.starts_with(b"%PDF"));
        assert!(pending.len() < scheduled.len());

        let _ = std::fs::remove_dir_all(fonts_dir);
    }

    #[test]
    fn field_table_accepts_every_row() {
        let rows = [("Nome", "Ana".to_string()), ("Idade", "10".to_string())];
        assert!(field_table(&rows).is_ok());
    }
}
